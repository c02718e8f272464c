use crate::error::{AnalyzerError, Result};
use crate::types::{
    ClassDecl, FunctionDecl, ImportKind, ImportStmt, ImportedName, NameRef, SourceFile,
    SourceInput,
};
use tree_sitter::{Node, Parser};

/// Lexical scope the walk is currently inside
#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    Module,
    Function,
    Class(&'a str),
}

/// Parses one Python file into a flat record of declarations and references
pub struct ModuleParser {
    parser: Parser,
}

impl ModuleParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        parser
            .set_language(&language)
            .map_err(|e| AnalyzerError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self { parser })
    }

    /// Parse a file into a SourceFile record.
    ///
    /// A syntax-invalid file yields a `ParseError`; callers record the file
    /// with empty declarations and keep going.
    pub fn parse(&mut self, input: &SourceInput) -> Result<SourceFile> {
        let tree = self
            .parser
            .parse(&input.text, None)
            .ok_or_else(|| AnalyzerError::parse(&input.path, "tree-sitter produced no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(AnalyzerError::parse(&input.path, "invalid syntax"));
        }

        let mut file = SourceFile::new(&input.path, &input.module, &input.text);
        file.docstring = block_docstring(root, &input.text);

        self.walk(root, &input.text, &mut file, Scope::Module);

        log::debug!(
            "Parsed {}: {} imports, {} classes, {} functions",
            file.path,
            file.imports.len(),
            file.classes.len(),
            file.functions.len()
        );

        Ok(file)
    }

    /// Recursive statement/expression walk collecting declarations and
    /// references. Conditional imports are found because the walk descends
    /// into every compound statement.
    fn walk(&self, node: Node, src: &str, file: &mut SourceFile, scope: Scope) {
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();

        for child in children {
            match child.kind() {
                "import_statement" => collect_plain_import(child, src, &mut file.imports),
                "import_from_statement" => collect_from_import(child, src, &mut file.imports),
                "future_import_statement" => collect_future_import(child, src, &mut file.imports),

                "class_definition" => {
                    let class = parse_class(child, src, &file.path);
                    let name = class.name.clone();
                    file.classes.push(class);
                    if let Some(body) = child.child_by_field_name("body") {
                        self.walk(body, src, file, Scope::Class(&name));
                    }
                }

                "function_definition" => {
                    if matches!(scope, Scope::Module) {
                        file.functions.push(parse_function(child, src, &file.path));
                    }
                    // Parameter and return annotations inside a class body
                    // reference other classes
                    if let Scope::Class(class_name) = scope {
                        if let Some(parameters) = child.child_by_field_name("parameters") {
                            self.walk(parameters, src, file, scope);
                        }
                        if let Some(return_type) = child.child_by_field_name("return_type") {
                            collect_annotation_refs(return_type, src, class_name, &mut file.references);
                        }
                    }
                    if let Some(body) = child.child_by_field_name("body") {
                        // Method bodies keep the class scope so references
                        // stay attributed to the enclosing class
                        let inner = match scope {
                            Scope::Class(name) => Scope::Class(name),
                            _ => Scope::Function,
                        };
                        self.walk(body, src, file, inner);
                    }
                }

                "call" => self.collect_call(child, src, file, scope),

                "attribute" => {
                    if let Scope::Class(class_name) = scope {
                        record_reference(child, src, class_name, &mut file.references);
                    }
                    // No descent: sub-attributes of a dotted chain are not
                    // separate references
                }

                "type" => {
                    if let Scope::Class(class_name) = scope {
                        collect_annotation_refs(child, src, class_name, &mut file.references);
                    }
                }

                _ => self.walk(child, src, file, scope),
            }
        }
    }

    /// Record a call target as a reference and detect dynamic imports
    /// (`__import__("m")`, `importlib.import_module("m")`) with a literal
    /// string argument
    fn collect_call(&self, node: Node, src: &str, file: &mut SourceFile, scope: Scope) {
        if let Some(function) = node.child_by_field_name("function") {
            let target = dotted_text(function, src);

            if let Some(ref name) = target {
                if name == "__import__" || name == "importlib.import_module" {
                    if let Some(module) = first_string_argument(node, src) {
                        file.imports
                            .push(ImportStmt::absolute(module, line_of(node)));
                    }
                }

                if let Scope::Class(class_name) = scope {
                    if !is_self_reference(name) {
                        file.references.push(NameRef {
                            class_name: class_name.to_string(),
                            name: name.clone(),
                            line: line_of(node),
                        });
                    }
                }
            }

            // Chained or computed call targets (e.g. factory()() or
            // table[k]()) still carry references in their subexpressions
            if target.is_none() {
                self.walk(function, src, file, scope);
            }
        }

        if let Some(arguments) = node.child_by_field_name("arguments") {
            self.walk(arguments, src, file, scope);
        }
    }
}

/// `import a.b, c as d` — one record per imported module
fn collect_plain_import(node: Node, src: &str, imports: &mut Vec<ImportStmt>) {
    let line = line_of(node);
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "dotted_name" => imports.push(ImportStmt {
                module: node_text(child, src).to_string(),
                names: Vec::new(),
                alias: None,
                kind: ImportKind::Absolute,
                level: 0,
                wildcard: false,
                line,
            }),
            "aliased_import" => {
                let module = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, src).to_string())
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .map(|n| node_text(n, src).to_string());
                imports.push(ImportStmt {
                    module,
                    names: Vec::new(),
                    alias,
                    kind: ImportKind::Absolute,
                    level: 0,
                    wildcard: false,
                    line,
                });
            }
            _ => {}
        }
    }
}

/// `from [.]*module import a, b as c` or `from m import *`
fn collect_from_import(node: Node, src: &str, imports: &mut Vec<ImportStmt>) {
    let Some(module_node) = node.child_by_field_name("module_name") else {
        return;
    };

    let (module, kind, level) = match module_node.kind() {
        "relative_import" => {
            let mut level = 0;
            let mut module = String::new();
            let mut cursor = module_node.walk();
            for part in module_node.children(&mut cursor) {
                match part.kind() {
                    "import_prefix" => {
                        level = node_text(part, src).chars().filter(|c| *c == '.').count();
                    }
                    "dotted_name" => module = node_text(part, src).to_string(),
                    _ => {}
                }
            }
            (module, ImportKind::Relative, level)
        }
        _ => (
            node_text(module_node, src).to_string(),
            ImportKind::Absolute,
            0,
        ),
    };

    let mut names = Vec::new();
    let mut wildcard = false;
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        if child.id() == module_node.id() {
            continue;
        }
        match child.kind() {
            "wildcard_import" => wildcard = true,
            "dotted_name" => names.push(ImportedName {
                name: node_text(child, src).to_string(),
                alias: None,
            }),
            "aliased_import" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, src).to_string())
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .map(|n| node_text(n, src).to_string());
                names.push(ImportedName { name, alias });
            }
            _ => {}
        }
    }

    imports.push(ImportStmt {
        module,
        names,
        alias: None,
        kind,
        level,
        wildcard,
        line: line_of(node),
    });
}

/// `from __future__ import annotations` has its own node kind
fn collect_future_import(node: Node, src: &str, imports: &mut Vec<ImportStmt>) {
    let mut names = Vec::new();
    let mut cursor = node.walk();

    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "dotted_name" => names.push(ImportedName {
                name: node_text(child, src).to_string(),
                alias: None,
            }),
            "aliased_import" => {
                let name = child
                    .child_by_field_name("name")
                    .map(|n| node_text(n, src).to_string())
                    .unwrap_or_default();
                let alias = child
                    .child_by_field_name("alias")
                    .map(|n| node_text(n, src).to_string());
                names.push(ImportedName { name, alias });
            }
            _ => {}
        }
    }

    imports.push(ImportStmt {
        module: "__future__".to_string(),
        names,
        alias: None,
        kind: ImportKind::Absolute,
        level: 0,
        wildcard: false,
        line: line_of(node),
    });
}

/// Extract a ClassDecl from a class_definition node
fn parse_class(node: Node, src: &str, file_path: &str) -> ClassDecl {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, src).to_string())
        .unwrap_or_default();

    let mut class = ClassDecl {
        name,
        file: file_path.to_string(),
        line: line_of(node),
        bases: Vec::new(),
        methods: Vec::new(),
        attributes: Default::default(),
        docstring: None,
    };

    if let Some(superclasses) = node.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for base in superclasses.named_children(&mut cursor) {
            // Positional bases only; keyword arguments (metaclass=...) are
            // not inheritance
            if matches!(base.kind(), "identifier" | "attribute") {
                if let Some(text) = dotted_text(base, src) {
                    class.bases.push(text);
                }
            }
        }
    }

    let Some(body) = node.child_by_field_name("body") else {
        return class;
    };

    class.docstring = block_docstring(body, src);

    let mut cursor = body.walk();
    let statements: Vec<_> = body.named_children(&mut cursor).collect();

    for statement in statements {
        let definition = match statement.kind() {
            "function_definition" => Some(statement),
            "decorated_definition" => statement
                .child_by_field_name("definition")
                .filter(|d| d.kind() == "function_definition"),
            _ => None,
        };

        if let Some(method) = definition {
            if let Some(method_name) = method.child_by_field_name("name") {
                let method_name = node_text(method_name, src).to_string();
                if method_name == "__init__" {
                    if let Some(method_body) = method.child_by_field_name("body") {
                        collect_self_attributes(method_body, src, &mut class);
                    }
                }
                class.methods.push(method_name);
            }
            continue;
        }

        // Class-body assignments: `x = ...` and annotated `x: T [= ...]`
        if statement.kind() == "expression_statement" {
            if let Some(expr) = statement.named_child(0) {
                if expr.kind() == "assignment" {
                    collect_assignment_targets(expr, src, &mut class);
                }
            }
        }
    }

    class
}

/// Names bound by a class-body assignment target
fn collect_assignment_targets(assignment: Node, src: &str, class: &mut ClassDecl) {
    let Some(left) = assignment.child_by_field_name("left") else {
        return;
    };

    match left.kind() {
        "identifier" => {
            class.attributes.insert(node_text(left, src).to_string());
        }
        "pattern_list" | "tuple_pattern" => {
            let mut cursor = left.walk();
            for target in left.named_children(&mut cursor) {
                if target.kind() == "identifier" {
                    class.attributes.insert(node_text(target, src).to_string());
                }
            }
        }
        _ => {}
    }
}

/// `self.x = ...` assignments anywhere inside `__init__`
fn collect_self_attributes(node: Node, src: &str, class: &mut ClassDecl) {
    if node.kind() == "assignment" {
        if let Some(left) = node.child_by_field_name("left") {
            if left.kind() == "attribute" {
                let object = left.child_by_field_name("object");
                let attribute = left.child_by_field_name("attribute");
                if let (Some(object), Some(attribute)) = (object, attribute) {
                    if object.kind() == "identifier" && node_text(object, src) == "self" {
                        class
                            .attributes
                            .insert(node_text(attribute, src).to_string());
                    }
                }
            }
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_self_attributes(child, src, class);
    }
}

/// Extract a FunctionDecl from a module-scope function_definition node
fn parse_function(node: Node, src: &str, file_path: &str) -> FunctionDecl {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(n, src).to_string())
        .unwrap_or_default();

    let mut parameters = Vec::new();
    if let Some(params) = node.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            let ident = match param.kind() {
                "identifier" => Some(param),
                "typed_parameter" | "list_splat_pattern" | "dictionary_splat_pattern" => param
                    .named_child(0)
                    .filter(|n| n.kind() == "identifier"),
                "default_parameter" | "typed_default_parameter" => param
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier"),
                _ => None,
            };
            if let Some(ident) = ident {
                parameters.push(node_text(ident, src).to_string());
            }
        }
    }

    let docstring = node
        .child_by_field_name("body")
        .and_then(|body| block_docstring(body, src));

    FunctionDecl {
        name,
        file: file_path.to_string(),
        line: line_of(node),
        parameters,
        docstring,
    }
}

/// Record one dotted reference, skipping self/cls chains
fn record_reference(node: Node, src: &str, class_name: &str, references: &mut Vec<NameRef>) {
    if let Some(name) = dotted_text(node, src) {
        if !is_self_reference(&name) {
            references.push(NameRef {
                class_name: class_name.to_string(),
                name,
                line: line_of(node),
            });
        }
    }
}

/// Identifiers and dotted names inside a type annotation
fn collect_annotation_refs(node: Node, src: &str, class_name: &str, references: &mut Vec<NameRef>) {
    match node.kind() {
        "identifier" | "attribute" => {
            record_reference(node, src, class_name, references);
        }
        _ => {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                collect_annotation_refs(child, src, class_name, references);
            }
        }
    }
}

fn is_self_reference(name: &str) -> bool {
    name == "self" || name == "cls" || name.starts_with("self.") || name.starts_with("cls.")
}

/// First string argument of a call, unquoted
fn first_string_argument(call: Node, src: &str) -> Option<String> {
    let arguments = call.child_by_field_name("arguments")?;
    let mut cursor = arguments.walk();
    for argument in arguments.named_children(&mut cursor) {
        if argument.kind() == "string" {
            return Some(string_text(argument, src));
        }
    }
    None
}

/// Render an identifier or attribute chain as a dotted string; chains with
/// non-name components (calls, subscripts) fall back to None
fn dotted_text(node: Node, src: &str) -> Option<String> {
    match node.kind() {
        "identifier" => Some(node_text(node, src).to_string()),
        "attribute" => {
            let object = node.child_by_field_name("object")?;
            let attribute = node.child_by_field_name("attribute")?;
            let base = dotted_text(object, src)?;
            Some(format!("{base}.{}", node_text(attribute, src)))
        }
        _ => None,
    }
}

/// Docstring: first statement of a module/class/function body, when it is a
/// plain string literal
fn block_docstring(block: Node, src: &str) -> Option<String> {
    let first = block.named_child(0)?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }
    Some(string_text(expr, src))
}

/// Literal content of a string node, quotes stripped
fn string_text(node: Node, src: &str) -> String {
    let mut content = String::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "string_content" {
            content.push_str(node_text(child, src));
        }
    }
    content
}

fn node_text<'a>(node: Node, src: &'a str) -> &'a str {
    &src[node.start_byte()..node.end_byte()]
}

fn line_of(node: Node) -> usize {
    node.start_position().row + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(path: &str, module: &str, text: &str) -> SourceFile {
        let mut parser = ModuleParser::new().unwrap();
        parser
            .parse(&SourceInput::new(path, module, text))
            .unwrap()
    }

    #[test]
    fn collects_plain_and_aliased_imports() {
        let file = parse(
            "app.py",
            "app",
            "import os\nimport os.path as p\nimport json, sys\n",
        );

        let modules: Vec<_> = file.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["os", "os.path", "json", "sys"]);
        assert_eq!(file.imports[1].alias.as_deref(), Some("p"));
        assert!(file
            .imports
            .iter()
            .all(|i| i.kind == ImportKind::Absolute && i.level == 0));
    }

    #[test]
    fn collects_from_imports_with_levels() {
        let file = parse(
            "pkg/sub/mod.py",
            "pkg.sub.mod",
            "from utils.parser import Parser\nfrom . import sibling\nfrom ..core import Base as B\n",
        );

        assert_eq!(file.imports.len(), 3);

        assert_eq!(file.imports[0].module, "utils.parser");
        assert_eq!(file.imports[0].kind, ImportKind::Absolute);
        assert_eq!(file.imports[0].names[0].name, "Parser");

        assert_eq!(file.imports[1].module, "");
        assert_eq!(file.imports[1].level, 1);
        assert_eq!(file.imports[1].names[0].name, "sibling");

        assert_eq!(file.imports[2].module, "core");
        assert_eq!(file.imports[2].kind, ImportKind::Relative);
        assert_eq!(file.imports[2].level, 2);
        assert_eq!(file.imports[2].names[0].alias.as_deref(), Some("B"));
    }

    #[test]
    fn records_wildcard_import_without_names() {
        let file = parse("a.py", "a", "from helpers import *\n");

        assert_eq!(file.imports.len(), 1);
        assert!(file.imports[0].wildcard);
        assert!(file.imports[0].names.is_empty());
        assert_eq!(file.imports[0].module, "helpers");
    }

    #[test]
    fn finds_conditional_and_dynamic_imports() {
        let code = r#"
import sys

if sys.version_info >= (3, 8):
    import importlib.metadata as md

def load(name):
    plugin = __import__("plugins.base")
    return plugin
"#;
        let file = parse("a.py", "a", code);

        let modules: Vec<_> = file.imports.iter().map(|i| i.module.as_str()).collect();
        assert_eq!(modules, vec!["sys", "importlib.metadata", "plugins.base"]);
    }

    #[test]
    fn extracts_class_with_methods_bases_and_attributes() {
        let code = r#"
class Handler(base.BaseHandler, Mixin):
    """Handles requests."""

    retries = 3

    def __init__(self, name):
        self.name = name
        if name:
            self.verbose = True

    def handle(self):
        pass

    def __repr__(self):
        return self.name
"#;
        let file = parse("handler.py", "handler", code);

        assert_eq!(file.classes.len(), 1);
        let class = &file.classes[0];
        assert_eq!(class.name, "Handler");
        assert_eq!(class.bases, vec!["base.BaseHandler", "Mixin"]);
        assert_eq!(class.methods, vec!["__init__", "handle", "__repr__"]);
        assert_eq!(class.docstring.as_deref(), Some("Handles requests."));

        let attributes: Vec<_> = class.attributes.iter().cloned().collect();
        assert_eq!(attributes, vec!["name", "retries", "verbose"]);
    }

    #[test]
    fn records_nested_classes() {
        let code = r#"
class Outer:
    class Inner:
        pass
"#;
        let file = parse("a.py", "a", code);
        let names: Vec<_> = file.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Outer", "Inner"]);
    }

    #[test]
    fn extracts_module_functions_only() {
        let code = r#"
def top(a, b=1, *args, **kwargs):
    """Top-level."""
    def inner():
        pass
    return a

class C:
    def method(self):
        pass
"#;
        let file = parse("a.py", "a", code);

        assert_eq!(file.functions.len(), 1);
        let function = &file.functions[0];
        assert_eq!(function.name, "top");
        assert_eq!(function.parameters, vec!["a", "b", "args", "kwargs"]);
        assert_eq!(function.docstring.as_deref(), Some("Top-level."));
    }

    #[test]
    fn collects_references_inside_class_bodies() {
        let code = r#"
class App:
    def run(self, parser: Parser):
        result = helpers.clean(parser)
        self.store(result)
        return Widget()
"#;
        let file = parse("app.py", "app", code);

        let names: Vec<_> = file.references.iter().map(|r| r.name.as_str()).collect();
        assert!(names.contains(&"Parser"));
        assert!(names.contains(&"helpers.clean"));
        assert!(names.contains(&"Widget"));
        // self.* chains are not references to other classes
        assert!(!names.iter().any(|n| n.starts_with("self")));
        assert!(file.references.iter().all(|r| r.class_name == "App"));
    }

    #[test]
    fn module_scope_calls_are_not_class_references() {
        let file = parse("a.py", "a", "print(len([1]))\n");
        assert!(file.references.is_empty());
    }

    #[test]
    fn reads_module_docstring() {
        let file = parse("a.py", "a", "\"\"\"Module doc.\"\"\"\nimport os\n");
        assert_eq!(file.docstring.as_deref(), Some("Module doc."));
    }

    #[test]
    fn rejects_invalid_syntax() {
        let mut parser = ModuleParser::new().unwrap();
        let result = parser.parse(&SourceInput::new("bad.py", "bad", "def broken(:\n"));
        assert!(matches!(
            result,
            Err(AnalyzerError::ParseError { .. })
        ));
    }
}
