use crate::error::Result;
use crate::export::{self, VisData};
use crate::highlight::{escape, Highlighter};
use depmap_graph::{ClassEntry, FileEntry, ProjectModel};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// AI-generated documentation attached to one file page
#[derive(Debug, Clone, Default)]
pub struct FileSummaryDoc {
    pub summary: String,
    pub purpose: String,
    pub markdown: String,
}

/// Writes the static documentation site: index, standalone graph pages,
/// one page per file and one per class, plus the stylesheet.
pub struct HtmlGenerator {
    project_name: String,
    highlighter: Highlighter,
}

impl HtmlGenerator {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            highlighter: Highlighter::new(),
        }
    }

    pub fn generate(
        &self,
        model: &ProjectModel,
        summaries: &BTreeMap<String, FileSummaryDoc>,
        output_dir: &Path,
    ) -> Result<()> {
        fs::create_dir_all(output_dir)?;
        fs::write(output_dir.join("style.css"), STYLESHEET)?;

        let graphs = export::export(model);
        fs::write(
            output_dir.join("files_graph.html"),
            graph_page("File dependencies", &graphs.files)?,
        )?;
        fs::write(
            output_dir.join("classes_graph.html"),
            graph_page("Class dependencies", &graphs.classes)?,
        )?;

        fs::write(
            output_dir.join("index.html"),
            self.index_page(model, summaries),
        )?;

        for entry in model.files() {
            let name = module_page_name(&entry.source.path);
            fs::write(
                output_dir.join(&name),
                self.module_page(model, entry, summaries.get(&entry.source.path)),
            )?;
        }

        for entry in model.classes() {
            let name = class_page_name(&entry.id);
            fs::write(output_dir.join(&name), self.class_page(model, entry))?;
        }

        log::info!(
            "Wrote documentation site: {} file pages, {} class pages -> {}",
            model.files().len(),
            model.classes().len(),
            output_dir.display()
        );

        Ok(())
    }

    fn index_page(
        &self,
        model: &ProjectModel,
        summaries: &BTreeMap<String, FileSummaryDoc>,
    ) -> String {
        let stats = model.stats();
        let mut body = String::new();

        let _ = write!(
            body,
            "<h1>{}</h1>\n<p class=\"subtitle\">Python dependency analysis</p>\n",
            escape(&self.project_name)
        );

        body.push_str("<section class=\"stats\">\n");
        for (label, value) in [
            ("Files", stats.files),
            ("Classes", stats.classes),
            ("Functions", stats.functions),
            ("Imports", stats.imports),
            ("External libraries", stats.external_libraries),
        ] {
            let _ = write!(
                body,
                "<div class=\"stat\"><span class=\"stat-value\">{value}</span><span class=\"stat-label\">{label}</span></div>\n"
            );
        }
        body.push_str("</section>\n");

        body.push_str(
            "<section>\n<h2>Dependency graphs</h2>\n<p>\
             <a class=\"button\" href=\"files_graph.html\">File graph</a> \
             <a class=\"button\" href=\"classes_graph.html\">Class graph</a></p>\n</section>\n",
        );

        if !model.external_libraries().is_empty() {
            body.push_str("<section>\n<h2>External libraries</h2>\n<table>\n<tr><th>Library</th><th>Imports</th></tr>\n");
            for (name, count) in model.external_libraries() {
                let _ = write!(body, "<tr><td>{}</td><td>{count}</td></tr>\n", escape(name));
            }
            body.push_str("</table>\n</section>\n");
        }

        body.push_str("<section>\n<h2>Files</h2>\n<table>\n<tr><th>File</th><th>Classes</th><th>Functions</th><th>Depends on</th><th>Used by</th><th>Summary</th></tr>\n");
        for entry in model.files() {
            let source = &entry.source;
            let summary = summaries
                .get(&source.path)
                .map(|doc| escape(&doc.summary))
                .or_else(|| source.docstring.as_deref().map(first_line))
                .unwrap_or_default();
            let _ = write!(
                body,
                "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{summary}</td></tr>\n",
                module_page_name(&source.path),
                escape(&source.path),
                source.classes.len(),
                source.functions.len(),
                entry.depends_on.len(),
                entry.used_by.len(),
            );
        }
        body.push_str("</table>\n</section>\n");

        if !model.diagnostics().is_empty() {
            body.push_str("<section>\n<h2>Diagnostics</h2>\n<ul class=\"diagnostics\">\n");
            for diagnostic in model.diagnostics() {
                let _ = write!(
                    body,
                    "<li><code>{}</code> {}: {}</li>\n",
                    diagnostic.kind,
                    escape(&diagnostic.file),
                    escape(&diagnostic.message)
                );
            }
            body.push_str("</ul>\n</section>\n");
        }

        page(&self.project_name, &body)
    }

    fn module_page(
        &self,
        model: &ProjectModel,
        entry: &FileEntry,
        summary: Option<&FileSummaryDoc>,
    ) -> String {
        let source = &entry.source;
        let mut body = String::new();

        let _ = write!(
            body,
            "<p><a href=\"index.html\">&larr; index</a></p>\n<h1>{}</h1>\n<p class=\"subtitle\">module <code>{}</code></p>\n",
            escape(&source.path),
            escape(&source.module)
        );

        if let Some(docstring) = &source.docstring {
            let _ = write!(body, "<p class=\"doc\">{}</p>\n", escape(docstring));
        }

        if let Some(doc) = summary {
            body.push_str("<section class=\"ai\">\n<h2>AI documentation</h2>\n");
            if !doc.purpose.is_empty() {
                let _ = write!(body, "<p><strong>Purpose:</strong> {}</p>\n", escape(&doc.purpose));
            }
            if !doc.summary.is_empty() {
                let _ = write!(body, "<p>{}</p>\n", escape(&doc.summary));
            }
            if !doc.markdown.is_empty() {
                let _ = write!(body, "<pre class=\"ai-doc\">{}</pre>\n", escape(&doc.markdown));
            }
            body.push_str("</section>\n");
        }

        if !entry.imports.is_empty() {
            body.push_str("<section>\n<h2>Imports</h2>\n<ul>\n");
            for import in &entry.imports {
                match &import.target {
                    Some(target) => {
                        let _ = write!(
                            body,
                            "<li><code>{}</code> &rarr; <a href=\"{}\">{}</a>{}</li>\n",
                            escape(&import.spec),
                            module_page_name(target),
                            escape(target),
                            if import.low_confidence {
                                " <em>(low confidence)</em>"
                            } else {
                                ""
                            }
                        );
                    }
                    None => {
                        let _ = write!(
                            body,
                            "<li><code>{}</code> <em>external</em></li>\n",
                            escape(&import.spec)
                        );
                    }
                }
            }
            body.push_str("</ul>\n</section>\n");
        }

        body.push_str(&link_list("Depends on", &entry.depends_on));
        body.push_str(&link_list("Used by", &entry.used_by));

        if !source.classes.is_empty() {
            body.push_str("<section>\n<h2>Classes</h2>\n");
            for class in &source.classes {
                let id = depmap_graph::class_id(&source.path, &class.name);
                let _ = write!(
                    body,
                    "<h3><a href=\"{}\">{}</a> <span class=\"line\">line {}</span></h3>\n",
                    class_page_name(&id),
                    escape(&class.name),
                    class.line
                );
                if let Some(class_entry) = model.class(&id) {
                    body.push_str(&bases_line(class_entry));
                }
                if let Some(docstring) = &class.docstring {
                    let _ = write!(body, "<p class=\"doc\">{}</p>\n", first_line(docstring));
                }
            }
            body.push_str("</section>\n");
        }

        if !source.functions.is_empty() {
            body.push_str("<section>\n<h2>Functions</h2>\n<ul>\n");
            for function in &source.functions {
                let _ = write!(
                    body,
                    "<li><code>{}({})</code> <span class=\"line\">line {}</span>{}</li>\n",
                    escape(&function.name),
                    escape(&function.parameters.join(", ")),
                    function.line,
                    function
                        .docstring
                        .as_deref()
                        .map(|d| format!(" &mdash; {}", first_line(d)))
                        .unwrap_or_default()
                );
            }
            body.push_str("</ul>\n</section>\n");
        }

        if !source.text.is_empty() {
            let _ = write!(
                body,
                "<section>\n<h2>Source</h2>\n<pre class=\"code\">{}</pre>\n</section>\n",
                self.highlighter.highlight(&source.text)
            );
        }

        page(&source.path, &body)
    }

    fn class_page(&self, model: &ProjectModel, entry: &ClassEntry) -> String {
        let decl = &entry.decl;
        let mut body = String::new();

        let _ = write!(
            body,
            "<p><a href=\"index.html\">&larr; index</a></p>\n<h1>{}</h1>\n<p class=\"subtitle\">declared in <a href=\"{}\">{}</a>, line {}</p>\n",
            escape(&decl.name),
            module_page_name(&decl.file),
            escape(&decl.file),
            decl.line
        );

        if let Some(docstring) = &decl.docstring {
            let _ = write!(body, "<p class=\"doc\">{}</p>\n", escape(docstring));
        }

        body.push_str(&bases_line(entry));

        if !decl.methods.is_empty() {
            body.push_str("<section>\n<h2>Methods</h2>\n<ul>\n");
            for method in &decl.methods {
                let _ = write!(body, "<li><code>{}</code></li>\n", escape(method));
            }
            body.push_str("</ul>\n</section>\n");
        }

        if !decl.attributes.is_empty() {
            body.push_str("<section>\n<h2>Attributes</h2>\n<ul>\n");
            for attribute in &decl.attributes {
                let _ = write!(body, "<li><code>{}</code></li>\n", escape(attribute));
            }
            body.push_str("</ul>\n</section>\n");
        }

        if !entry.uses.is_empty() {
            body.push_str("<section>\n<h2>Uses</h2>\n<ul>\n");
            for edge in &entry.uses {
                if let Some(target) = &edge.resolved {
                    if let Some(target_entry) = model.class(target) {
                        let _ = write!(
                            body,
                            "<li><a href=\"{}\">{}</a>{}</li>\n",
                            class_page_name(target),
                            escape(&target_entry.decl.name),
                            if edge.low_confidence {
                                " <em>(low confidence)</em>"
                            } else {
                                ""
                            }
                        );
                    }
                }
            }
            body.push_str("</ul>\n</section>\n");
        }

        if !entry.used_by.is_empty() {
            body.push_str("<section>\n<h2>Used by</h2>\n<ul>\n");
            for id in &entry.used_by {
                if let Some(user) = model.class(id) {
                    let _ = write!(
                        body,
                        "<li><a href=\"{}\">{}</a> <span class=\"line\">{}</span></li>\n",
                        class_page_name(id),
                        escape(&user.decl.name),
                        escape(&user.decl.file)
                    );
                }
            }
            body.push_str("</ul>\n</section>\n");
        }

        page(&decl.name, &body)
    }
}

/// Inheritance line for a class, resolved bases linked and external ones as
/// plain labels
fn bases_line(entry: &ClassEntry) -> String {
    if entry.bases.is_empty() {
        return String::new();
    }

    let mut rendered = Vec::new();
    for base in &entry.bases {
        match &base.resolved {
            Some(target) => rendered.push(format!(
                "<a href=\"{}\">{}</a>{}",
                class_page_name(target),
                escape(&base.target_name),
                if base.low_confidence {
                    " <em>(low confidence)</em>"
                } else {
                    ""
                }
            )),
            None => rendered.push(format!("<code>{}</code>", escape(&base.target_name))),
        }
    }

    format!("<p class=\"bases\">inherits: {}</p>\n", rendered.join(", "))
}

fn link_list(title: &str, paths: &[String]) -> String {
    if paths.is_empty() {
        return String::new();
    }
    let mut section = format!("<section>\n<h2>{title}</h2>\n<ul>\n");
    for path in paths {
        let _ = write!(
            section,
            "<li><a href=\"{}\">{}</a></li>\n",
            module_page_name(path),
            escape(path)
        );
    }
    section.push_str("</ul>\n</section>\n");
    section
}

/// Page shell shared by all generated documents
fn page(title: &str, body: &str) -> String {
    PAGE_TEMPLATE
        .replace("__TITLE__", &escape(title))
        .replace("__BODY__", body)
}

/// Standalone interactive graph page (vis-network)
fn graph_page(title: &str, data: &VisData) -> Result<String> {
    let json = serde_json::to_string(data)?;
    Ok(GRAPH_TEMPLATE
        .replace("__TITLE__", &escape(title))
        .replace("__DATA__", &json))
}

/// Page file name for a source file: `app/main.py` -> `app_main.html`
pub fn module_page_name(path: &str) -> String {
    let flat = path.replace(['/', '\\'], "_");
    format!("{}.html", flat.trim_end_matches(".py"))
}

/// Page file name for a class id: `app/main.py::App` -> `app_main_App.html`
pub fn class_page_name(id: &str) -> String {
    let flat = id
        .replace("::", "_")
        .replace(['/', '\\'], "_")
        .replace(".py", "");
    format!("class_{flat}.html")
}

fn first_line(text: &str) -> String {
    escape(text.lines().next().unwrap_or_default())
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>__TITLE__</title>
<link rel="stylesheet" href="style.css">
</head>
<body>
<main>
__BODY__
</main>
</body>
</html>
"#;

const GRAPH_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<link rel="stylesheet" href="style.css">
<script src="https://unpkg.com/vis-network@9.1.9/dist/vis-network.min.js"></script>
<style>#network { width: 100%; height: 90vh; border: 1px solid #e5e7eb; }</style>
</head>
<body>
<main>
<p><a href="index.html">&larr; index</a></p>
<h1>__TITLE__</h1>
<div id="network"></div>
<script>
const data = __DATA__;
const container = document.getElementById("network");
const network = new vis.Network(container, {
  nodes: new vis.DataSet(data.nodes),
  edges: new vis.DataSet(data.edges)
}, {
  physics: {
    enabled: true,
    stabilization: { iterations: 100 },
    barnesHut: {
      gravitationalConstant: -8000,
      centralGravity: 0.3,
      springLength: 95,
      springConstant: 0.04,
      damping: 0.09
    }
  }
});
</script>
</main>
</body>
</html>
"#;

const STYLESHEET: &str = r#"body {
  margin: 0;
  font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
  color: #111827;
  background: #f9fafb;
}
main { max-width: 960px; margin: 0 auto; padding: 2rem 1rem; }
h1 { margin-bottom: 0.25rem; }
.subtitle { color: #6b7280; margin-top: 0; }
section { margin-top: 2rem; }
.stats { display: flex; flex-wrap: wrap; gap: 1rem; }
.stat {
  background: #ffffff;
  border: 1px solid #e5e7eb;
  border-radius: 8px;
  padding: 1rem 1.5rem;
  display: flex;
  flex-direction: column;
  align-items: center;
}
.stat-value { font-size: 1.75rem; font-weight: 600; }
.stat-label { color: #6b7280; font-size: 0.85rem; }
.button {
  display: inline-block;
  background: #2563eb;
  color: #ffffff;
  padding: 0.5rem 1rem;
  border-radius: 6px;
  text-decoration: none;
}
table { border-collapse: collapse; width: 100%; background: #ffffff; }
th, td { border: 1px solid #e5e7eb; padding: 0.5rem 0.75rem; text-align: left; }
th { background: #f3f4f6; }
a { color: #2563eb; text-decoration: none; }
a:hover { text-decoration: underline; }
code { background: #f3f4f6; padding: 0.1rem 0.3rem; border-radius: 4px; }
.doc { color: #374151; font-style: italic; }
.bases { color: #374151; }
.line { color: #9ca3af; font-size: 0.85rem; font-weight: 400; }
.diagnostics li { margin-bottom: 0.25rem; }
.ai { background: #eff6ff; border: 1px solid #bfdbfe; border-radius: 8px; padding: 0 1rem 1rem; }
.ai-doc { white-space: pre-wrap; }
pre.code {
  background: #111827;
  color: #e5e7eb;
  padding: 1rem;
  border-radius: 8px;
  overflow-x: auto;
  line-height: 1.45;
}
.hl-kw { color: #93c5fd; }
.hl-str { color: #86efac; }
.hl-com { color: #9ca3af; font-style: italic; }
.hl-num { color: #fcd34d; }
.hl-dec { color: #c4b5fd; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use depmap_analyzer::SourceInput;
    use depmap_graph::analyze;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn page_names_are_flat() {
        assert_eq!(module_page_name("app/main.py"), "app_main.html");
        assert_eq!(class_page_name("app/main.py::App"), "class_app_main_App.html");
    }

    #[test]
    fn writes_complete_site() {
        let model = analyze(&[
            SourceInput::new(
                "app/main.py",
                "app.main",
                "from utils.parser import Parser\n\nclass App:\n    def run(self):\n        return Parser()\n",
            ),
            SourceInput::new(
                "utils/parser.py",
                "utils.parser",
                "class Parser:\n    \"\"\"Parses things.\"\"\"\n    pass\n",
            ),
        ])
        .unwrap();

        let temp = tempdir().unwrap();
        let generator = HtmlGenerator::new("demo");
        generator
            .generate(&model, &BTreeMap::new(), temp.path())
            .unwrap();

        for name in [
            "index.html",
            "style.css",
            "files_graph.html",
            "classes_graph.html",
            "app_main.html",
            "utils_parser.html",
            "class_app_main_App.html",
            "class_utils_parser_Parser.html",
        ] {
            assert!(temp.path().join(name).exists(), "missing {name}");
        }

        let index = std::fs::read_to_string(temp.path().join("index.html")).unwrap();
        assert!(index.contains("app/main.py"));
        assert!(index.contains("files_graph.html"));

        let module = std::fs::read_to_string(temp.path().join("app_main.html")).unwrap();
        assert!(module.contains("utils_parser.html"));
        assert!(module.contains("hl-kw"));
    }
}
