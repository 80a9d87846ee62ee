//! # Host facts
//!
//! The compiler that parses the pre-processed translation unit is an
//! external collaborator. A host adapter walks its AST and pre-processor and
//! dumps what the rules need as plain facts:
//!
//! - declaration contexts of the unit and of every function (for type recovery),
//! - every `sqlstm` block emitted by the Pro*C pre-processor,
//! - every macro expansion seen while parsing,
//! - assignments and calls (the matcher results the literal hunter needs).
//!
//! The facts deserialize from JSON, which is how the command-line driver
//! receives them. Matcher queries are plain iterator filters over the facts.

use std::fmt;

use proc_modernize_core::{SourceBuffer, SourceRange, Span};
use serde::{Deserialize, Serialize};

// ─────────────────────── Types ───────────────────────

/// Record tag keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordTag {
    #[default]
    Struct,
    Class,
    Union,
}

impl fmt::Display for RecordTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordTag::Struct => write!(f, "struct"),
            RecordTag::Class => write!(f, "class"),
            RecordTag::Union => write!(f, "union"),
        }
    }
}

/// A C/C++ type as the host spells and structures it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CType {
    /// `int`, `unsigned short`, `char`, `OCIBlobLocator`, ...
    Builtin { name: String },
    /// `T [N]`
    ConstantArray { element: Box<CType>, size: u64 },
    /// `T *`
    Pointer { pointee: Box<CType> },
    /// A class, struct or union. Anonymous records carry the host's
    /// synthesized name (e.g. `(anonymous at emp.c:4:5)`).
    Record {
        name: String,
        #[serde(default)]
        tag: RecordTag,
        #[serde(default)]
        anonymous: bool,
    },
    /// A typedef name and the type it stands for.
    Typedef { name: String, underlying: Box<CType> },
}

impl CType {
    pub fn builtin(name: impl Into<String>) -> Self {
        CType::Builtin { name: name.into() }
    }

    pub fn array(element: CType, size: u64) -> Self {
        CType::ConstantArray {
            element: Box::new(element),
            size,
        }
    }

    pub fn pointer(pointee: CType) -> Self {
        CType::Pointer {
            pointee: Box::new(pointee),
        }
    }

    pub fn record(name: impl Into<String>) -> Self {
        CType::Record {
            name: name.into(),
            tag: RecordTag::Struct,
            anonymous: false,
        }
    }

    pub fn anonymous_record(name: impl Into<String>) -> Self {
        CType::Record {
            name: name.into(),
            tag: RecordTag::Struct,
            anonymous: true,
        }
    }

    pub fn typedef(name: impl Into<String>, underlying: CType) -> Self {
        CType::Typedef {
            name: name.into(),
            underlying: Box::new(underlying),
        }
    }

    /// The type as the compiler would print it (`char [32]`, `struct emp *`).
    pub fn spelling(&self) -> String {
        match self {
            CType::Builtin { name } => name.clone(),
            CType::ConstantArray { element, size } => format!("{} [{size}]", element.spelling()),
            CType::Pointer { pointee } => format!("{} *", pointee.spelling()),
            CType::Record {
                name,
                tag,
                anonymous,
            } => {
                if *anonymous {
                    format!("{tag} {name}")
                } else if name.starts_with(&format!("{tag} ")) {
                    name.clone()
                } else {
                    format!("{tag} {name}")
                }
            }
            CType::Typedef { name, .. } => name.clone(),
        }
    }

    /// Strip typedef sugar.
    pub fn desugar(&self) -> &CType {
        let mut ty = self;
        while let CType::Typedef { underlying, .. } = ty {
            ty = underlying;
        }
        ty
    }

    /// Element type and count when the (desugared) type is a constant array.
    pub fn as_constant_array(&self) -> Option<(&CType, u64)> {
        match self.desugar() {
            CType::ConstantArray { element, size } => Some((element, *size)),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.desugar(), CType::Pointer { .. })
    }

    /// The record reached through typedefs and at most one pointer level.
    pub fn pointee_record(&self) -> Option<&CType> {
        match self.desugar() {
            rec @ CType::Record { .. } => Some(rec),
            CType::Pointer { pointee } => match pointee.desugar() {
                rec @ CType::Record { .. } => Some(rec),
                _ => None,
            },
            _ => None,
        }
    }
}

// ─────────────────────── Declarations ───────────────────────

/// A variable or parameter declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CType,
    #[serde(default)]
    pub line: u32,
}

/// A field of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CType,
}

/// A class/struct/union definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    #[serde(default)]
    pub tag: RecordTag,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Records declared inside this record.
    #[serde(default)]
    pub nested: DeclContext,
}

/// A typedef.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: CType,
}

/// A named declaration inside a [`DeclContext`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum NamedDecl {
    Var(VarDecl),
    Record(RecordDecl),
    Typedef(TypedefDecl),
}

impl NamedDecl {
    pub fn name(&self) -> &str {
        match self {
            NamedDecl::Var(v) => &v.name,
            NamedDecl::Record(r) => &r.name,
            NamedDecl::Typedef(t) => &t.name,
        }
    }
}

/// A scope: its own declarations plus the scopes nested in it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeclContext {
    #[serde(default)]
    pub decls: Vec<NamedDecl>,
    #[serde(default)]
    pub nested: Vec<DeclContext>,
}

impl DeclContext {
    /// Depth-first iterator over this context and every context reachable
    /// from it, including the member contexts of records.
    pub fn all_contexts(&self) -> Vec<&DeclContext> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(ctx) = stack.pop() {
            out.push(ctx);
            for decl in ctx.decls.iter().rev() {
                if let NamedDecl::Record(rec) = decl {
                    stack.push(&rec.nested);
                }
            }
            for nested in ctx.nested.iter().rev() {
                stack.push(nested);
            }
        }
        out
    }
}

/// A function definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub start_line: u32,
    #[serde(default)]
    pub end_line: u32,
    /// Parameters and the body's scopes.
    #[serde(default)]
    pub context: DeclContext,
}

// ─────────────────────── Matches ───────────────────────

/// A compound statement holding the Pro*C generated `struct sqlexd sqlstm;`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlstmBlock {
    /// Name of the enclosing function.
    pub function: String,
    /// Byte range of the compound statement in the main buffer.
    pub span: Span,
}

/// Pre-processor token kinds the snoop distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Identifier,
    StringLiteral,
    WideStringLiteral,
    Utf8StringLiteral,
    Utf16StringLiteral,
    Utf32StringLiteral,
    AngleStringLiteral,
    NumericConstant,
    CharConstant,
    Punctuation,
    Other,
}

impl TokenKind {
    /// String literal kinds other than the plain narrow one.
    pub fn is_unsupported_string(self) -> bool {
        matches!(
            self,
            TokenKind::WideStringLiteral
                | TokenKind::Utf8StringLiteral
                | TokenKind::Utf16StringLiteral
                | TokenKind::Utf32StringLiteral
                | TokenKind::AngleStringLiteral
        )
    }
}

/// One token of a macro definition body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroToken {
    pub kind: TokenKind,
    pub text: String,
    pub range: SourceRange,
}

/// A macro expansion reported by the pre-processor callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroExpansion {
    pub name: String,
    /// Where the macro was used.
    pub usage: SourceRange,
    /// The whole `#define` directive.
    pub definition: SourceRange,
    /// Tokens of the replacement list.
    #[serde(default)]
    pub tokens: Vec<MacroToken>,
    #[serde(default = "default_true")]
    pub in_main_file: bool,
}

fn default_true() -> bool {
    true
}

/// An expression operand as the matchers bind it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExprFact {
    /// Source spelling of the expression.
    pub text: String,
    /// Variable the expression refers to (`buf` for `buf`, `dst` for `dst.len`).
    #[serde(default)]
    pub decl_ref: Option<String>,
    /// Member accessed on `decl_ref` (`len` for `dst.len`).
    #[serde(default)]
    pub member: Option<String>,
    /// Macro the expression was expanded from.
    #[serde(default)]
    pub macro_name: Option<String>,
    #[serde(default, rename = "type")]
    pub ty: Option<CType>,
}

impl ExprFact {
    pub fn var(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            text: name.clone(),
            decl_ref: Some(name),
            ..Default::default()
        }
    }

    pub fn macro_use(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            text: name.clone(),
            macro_name: Some(name),
            ..Default::default()
        }
    }

    /// The name this operand is known by: referenced variable, macro, or text.
    pub fn name(&self) -> &str {
        self.decl_ref
            .as_deref()
            .or(self.macro_name.as_deref())
            .unwrap_or(self.text.trim())
    }
}

/// `lhs = rhs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub function: String,
    pub line: u32,
    pub lhs: ExprFact,
    pub rhs: ExprFact,
}

/// `callee(args...)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallExpr {
    pub function: String,
    pub line: u32,
    pub callee: String,
    #[serde(default)]
    pub args: Vec<ExprFact>,
}

// ─────────────────────── Translation Unit ───────────────────────

/// Everything the rules learn about one translation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Path of the pre-processed file (the Pro*C output).
    pub main_file: String,
    /// Contents of the main file; spans are byte offsets into it.
    pub buffer: String,
    #[serde(default)]
    pub context: DeclContext,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
    #[serde(default)]
    pub macro_expansions: Vec<MacroExpansion>,
    #[serde(default)]
    pub sqlstm_blocks: Vec<SqlstmBlock>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub calls: Vec<CallExpr>,
}

impl TranslationUnit {
    /// Parse a JSON fact dump.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The main buffer, indexed.
    pub fn source(&self) -> SourceBuffer {
        SourceBuffer::verbatim(self.main_file.clone(), self.buffer.clone())
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Assignments in `function` whose left-hand side refers to `var`.
    pub fn assignments_to<'a>(
        &'a self,
        function: &'a str,
        var: &'a str,
    ) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.assignments
            .iter()
            .filter(move |a| a.function == function && a.lhs.decl_ref.as_deref() == Some(var))
    }

    /// Calls to `callee` inside `function`.
    pub fn calls_to<'a>(
        &'a self,
        function: &'a str,
        callee: &'a str,
    ) -> impl Iterator<Item = &'a CallExpr> + 'a {
        self.calls
            .iter()
            .filter(move |c| c.function == function && c.callee == callee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_spelling() {
        assert_eq!(CType::builtin("int").spelling(), "int");
        assert_eq!(CType::array(CType::builtin("char"), 32).spelling(), "char [32]");
        assert_eq!(CType::pointer(CType::record("emp")).spelling(), "struct emp *");
        assert_eq!(CType::record("struct emp").spelling(), "struct emp");
        let td = CType::typedef("emp_t", CType::record("emp"));
        assert_eq!(td.spelling(), "emp_t");
    }

    #[test]
    fn test_desugar_reaches_array() {
        let td = CType::typedef("name_t", CType::array(CType::builtin("char"), 16));
        let (elem, size) = td.as_constant_array().unwrap();
        assert_eq!(elem.spelling(), "char");
        assert_eq!(size, 16);
    }

    #[test]
    fn test_pointee_record() {
        let ty = CType::pointer(CType::typedef("emp_t", CType::anonymous_record("(anonymous at e.c:3:9)")));
        assert!(ty.is_pointer());
        assert!(matches!(ty.pointee_record(), Some(CType::Record { anonymous: true, .. })));
        assert!(CType::builtin("int").pointee_record().is_none());
    }

    #[test]
    fn test_all_contexts_visits_nested_and_record_members() {
        let inner = RecordDecl {
            name: "inner".into(),
            tag: RecordTag::Struct,
            anonymous: false,
            fields: vec![],
            nested: DeclContext::default(),
        };
        let outer = RecordDecl {
            name: "outer".into(),
            tag: RecordTag::Struct,
            anonymous: false,
            fields: vec![],
            nested: DeclContext {
                decls: vec![NamedDecl::Record(inner)],
                nested: vec![],
            },
        };
        let tu = DeclContext {
            decls: vec![NamedDecl::Record(outer)],
            nested: vec![DeclContext::default()],
        };
        let names: Vec<&str> = tu
            .all_contexts()
            .iter()
            .flat_map(|c| c.decls.iter().map(NamedDecl::name))
            .collect();
        assert_eq!(names, vec!["outer", "inner"]);
        assert_eq!(tu.all_contexts().len(), 4);
    }

    #[test]
    fn test_translation_unit_from_json() {
        let json = r#"{
            "main_file": "emp.c",
            "buffer": "int main() {}\n",
            "functions": [{
                "name": "main",
                "context": { "decls": [
                    { "decl": "var", "name": "age", "type": { "kind": "builtin", "name": "int" } }
                ] }
            }],
            "sqlstm_blocks": [{ "function": "main", "span": { "start": 11, "end": 13 } }],
            "assignments": [{
                "function": "main", "line": 1,
                "lhs": { "text": "buf", "decl_ref": "buf" },
                "rhs": { "text": "tmp", "decl_ref": "tmp" }
            }]
        }"#;
        let tu = TranslationUnit::from_json(json).unwrap();
        assert_eq!(tu.functions[0].context.decls[0].name(), "age");
        assert_eq!(tu.sqlstm_blocks[0].span, Span::new(11, 13));
        assert_eq!(tu.assignments_to("main", "buf").count(), 1);
        assert_eq!(tu.assignments_to("other", "buf").count(), 0);
    }

    #[test]
    fn test_expr_fact_name() {
        assert_eq!(ExprFact::var("tmp").name(), "tmp");
        assert_eq!(ExprFact::macro_use("SZ").name(), "SZ");
        let lit = ExprFact {
            text: " 4000 ".into(),
            ..Default::default()
        };
        assert_eq!(lit.name(), "4000");
    }
}
