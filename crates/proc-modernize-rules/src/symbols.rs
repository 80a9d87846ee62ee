//! # Symbol resolver
//!
//! Recovers the declared type of host variables: the variable itself from
//! the enclosing function (falling back to unit-level globals), and record
//! members from the record definitions reachable in the translation unit.

use std::collections::BTreeMap;

use crate::host::{CType, DeclContext, FunctionDecl, NamedDecl, RecordDecl, TranslationUnit, VarDecl};
use crate::hostvar::HostPath;

// ─────────────────────── Errors ───────────────────────

/// Symbol resolution errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum SymbolError {
    #[error("host variable '{name}' is not declared in function '{function}'")]
    NotFound { name: String, function: String },

    #[error("'{name}' of type '{type_name}' is not a record")]
    NotARecord { name: String, type_name: String },

    #[error("record '{record}' has no member '{member}'")]
    NoSuchMember { record: String, member: String },
}

// ─────────────────────── Symbol Info ───────────────────────

/// Element type and count of a constant array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayInfo {
    pub element_type: String,
    pub element_size: u64,
}

/// Where a resolved member lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub record_name: String,
    pub field_name: String,
    pub field_type_name: String,
}

/// What the resolver learned about one symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    pub sym_name: String,
    pub type_name: String,
    pub ty: CType,
    pub array: Option<ArrayInfo>,
    pub field: Option<FieldInfo>,
}

impl SymbolInfo {
    fn new(name: &str, ty: &CType) -> Self {
        Self {
            sym_name: name.to_string(),
            type_name: ty.spelling(),
            ty: ty.clone(),
            array: ty.as_constant_array().map(|(element, size)| ArrayInfo {
                element_type: element.spelling(),
                element_size: size,
            }),
            field: None,
        }
    }

    pub fn from_var(var: &VarDecl) -> Self {
        Self::new(&var.name, &var.ty)
    }

    /// Key/value view (`symName`, `typeName`, `elementType`, ...).
    pub fn to_record(&self) -> BTreeMap<&'static str, String> {
        let mut record = BTreeMap::new();
        record.insert("symName", self.sym_name.clone());
        record.insert("typeName", self.type_name.clone());
        if let Some(array) = &self.array {
            record.insert("elementType", array.element_type.clone());
            record.insert("elementSize", array.element_size.to_string());
        }
        if let Some(field) = &self.field {
            record.insert("recordName", field.record_name.clone());
            record.insert("fieldName", field.field_name.clone());
            record.insert("fieldTypeName", field.field_type_name.clone());
        }
        record
    }

    /// C declarator for a by-value parameter named `param`: `char name[32]`, `int age`.
    pub fn declarator(&self, param: &str) -> String {
        match &self.array {
            Some(array) => format!("{} {param}[{}]", array.element_type, array.element_size),
            None => format!("{} {param}", self.type_name),
        }
    }
}

// ─────────────────────── Lookups ───────────────────────

/// Find the declaration of `name` in any scope of `func`.
pub fn find_symbol_in_function<'a>(name: &str, func: &'a FunctionDecl) -> Option<&'a VarDecl> {
    find_var(&func.context, name)
}

fn find_var<'a>(ctx: &'a DeclContext, name: &str) -> Option<&'a VarDecl> {
    ctx.all_contexts()
        .into_iter()
        .flat_map(|c| c.decls.iter())
        .find_map(|decl| match decl {
            NamedDecl::Var(var) if var.name == name => Some(var),
            _ => None,
        })
}

/// Find `name` in `function`, then among the unit's globals.
pub fn find_symbol<'a>(tu: &'a TranslationUnit, function: &str, name: &str) -> Option<&'a VarDecl> {
    tu.function(function)
        .and_then(|f| find_symbol_in_function(name, f))
        .or_else(|| find_var(&tu.context, name))
}

/// Compare record spellings with or without a tag keyword.
fn same_record_name(candidate: &str, wanted: &str) -> bool {
    fn strip(s: &str) -> &str {
        ["struct ", "class ", "union "]
            .iter()
            .find_map(|tag| s.strip_prefix(tag))
            .unwrap_or(s)
            .trim()
    }
    strip(candidate) == strip(wanted)
}

fn unit_contexts(tu: &TranslationUnit) -> impl Iterator<Item = &DeclContext> {
    tu.context
        .all_contexts()
        .into_iter()
        .chain(tu.functions.iter().flat_map(|f| f.context.all_contexts()))
}

/// Find a record definition by spelling, directly or through a typedef.
pub fn find_record<'a>(tu: &'a TranslationUnit, record_name: &str) -> Option<&'a RecordDecl> {
    let direct = unit_contexts(tu)
        .flat_map(|c| c.decls.iter())
        .find_map(|decl| match decl {
            NamedDecl::Record(rec) if same_record_name(&rec.name, record_name) => Some(rec),
            _ => None,
        });
    if direct.is_some() {
        return direct;
    }
    let aliased = unit_contexts(tu)
        .flat_map(|c| c.decls.iter())
        .find_map(|decl| match decl {
            NamedDecl::Typedef(td) if td.name == record_name => match td.ty.desugar() {
                CType::Record { name, .. } => Some(name.clone()),
                _ => None,
            },
            _ => None,
        })?;
    unit_contexts(tu)
        .flat_map(|c| c.decls.iter())
        .find_map(|decl| match decl {
            NamedDecl::Record(rec) if same_record_name(&rec.name, &aliased) => Some(rec),
            _ => None,
        })
}

/// Find `member` of the record spelled `record_name`.
pub fn find_record_member_in_translation_unit(
    tu: &TranslationUnit,
    record_name: &str,
    member: &str,
) -> Option<SymbolInfo> {
    let record = find_record(tu, record_name)?;
    let field = record.fields.iter().find(|f| f.name == member)?;
    let mut info = SymbolInfo::new(&field.name, &field.ty);
    info.field = Some(FieldInfo {
        record_name: record.name.clone(),
        field_name: field.name.clone(),
        field_type_name: field.ty.spelling(),
    });
    Some(info)
}

/// Resolve the root of `path` in `function`.
pub fn resolve_root(
    tu: &TranslationUnit,
    function: &str,
    path: &HostPath,
) -> Result<SymbolInfo, SymbolError> {
    let var = find_symbol(tu, function, path.root()).ok_or_else(|| SymbolError::NotFound {
        name: path.root().to_string(),
        function: function.to_string(),
    })?;
    Ok(SymbolInfo::new(&var.name, &var.ty))
}

/// Resolve the type at the end of `path`, following each dereference.
pub fn resolve_path(
    tu: &TranslationUnit,
    function: &str,
    path: &HostPath,
) -> Result<SymbolInfo, SymbolError> {
    let mut info = resolve_root(tu, function, path)?;
    for member in path.members() {
        let record_name = match info.ty.pointee_record() {
            Some(CType::Record { name, .. }) => name.clone(),
            _ => {
                return Err(SymbolError::NotARecord {
                    name: info.sym_name.clone(),
                    type_name: info.type_name.clone(),
                })
            }
        };
        info = find_record_member_in_translation_unit(tu, &record_name, member).ok_or_else(
            || SymbolError::NoSuchMember {
                record: record_name.clone(),
                member: member.to_string(),
            },
        )?;
    }
    Ok(info)
}
