use regex::{Captures, Regex};

/// Regex-based Python syntax highlighter for the generated file pages.
///
/// Works on HTML-escaped source, one pass, longest-alternative-first so
/// strings swallow keywords and `#` characters inside them.
pub struct Highlighter {
    pattern: Regex,
}

const KEYWORDS: &str = "False|None|True|and|as|assert|async|await|break|class|continue|def|del|\
elif|else|except|finally|for|from|global|if|import|in|is|lambda|nonlocal|not|or|pass|raise|\
return|try|while|with|yield";

impl Highlighter {
    pub fn new() -> Self {
        let pattern = format!(
            r#"(?P<string>[rbuRBUfF]*(?:"""[\s\S]*?"""|'''[\s\S]*?'''|"(?:[^"\\\n]|\\.)*"|'(?:[^'\\\n]|\\.)*'))|(?P<comment>#[^\n]*)|(?P<decorator>@[A-Za-z_][A-Za-z0-9_.]*)|(?P<keyword>\b(?:{KEYWORDS})\b)|(?P<number>\b\d[\d_]*(?:\.\d+)?(?:[eE][+-]?\d+)?\b)"#
        );
        Self {
            pattern: Regex::new(&pattern).expect("highlight pattern compiles"),
        }
    }

    /// Escape the source and wrap recognized tokens in span classes
    pub fn highlight(&self, source: &str) -> String {
        let escaped = escape(source);
        self.pattern
            .replace_all(&escaped, |caps: &Captures| {
                let class = if caps.name("string").is_some() {
                    "hl-str"
                } else if caps.name("comment").is_some() {
                    "hl-com"
                } else if caps.name("decorator").is_some() {
                    "hl-dec"
                } else if caps.name("keyword").is_some() {
                    "hl-kw"
                } else {
                    "hl-num"
                };
                format!(r#"<span class="{class}">{}</span>"#, &caps[0])
            })
            .into_owned()
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimal HTML escaping; quotes stay intact so the token regexes still see
/// string literals
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlights_keywords_strings_and_comments() {
        let html = Highlighter::new().highlight("def f():\n    return \"ok\"  # done\n");

        assert!(html.contains(r#"<span class="hl-kw">def</span>"#));
        assert!(html.contains(r#"<span class="hl-kw">return</span>"#));
        assert!(html.contains(r#"<span class="hl-str">"ok"</span>"#));
        assert!(html.contains(r#"<span class="hl-com"># done</span>"#));
    }

    #[test]
    fn keywords_inside_strings_stay_plain() {
        let html = Highlighter::new().highlight("x = \"import os\"\n");
        assert!(html.contains(r#"<span class="hl-str">"import os"</span>"#));
        assert!(!html.contains(r#"<span class="hl-kw">import</span>"#));
    }

    #[test]
    fn escapes_markup() {
        let html = Highlighter::new().highlight("a < b\n");
        assert!(html.contains("a &lt; b"));
    }
}
