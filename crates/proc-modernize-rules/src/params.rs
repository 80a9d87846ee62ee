//! Generated-function signatures.
//!
//! Every host variable of a statement becomes a parameter of the request
//! function. By default each variable is passed on its own, named after its
//! leaf identifier, and the SQL text is rewritten to use those names:
//! `:rec->name:indRec->ind` becomes `:name:ind` with parameters
//! `char name[32], short ind`. With argument simplification, records are
//! passed once as a whole and the SQL keeps its dereferences.
//!
//! Records without a name cannot be spelled in a parameter list, so a local
//! typedef is generated for each of them.

use tracing::trace;

use crate::host::{CType, FieldDecl, TranslationUnit};
use crate::hostvar::{decode_host_vars, HostPath};
use crate::hunter::declare;
use crate::statement::ExecSqlStatement;
use crate::symbols::{find_record, resolve_path, resolve_root, SymbolError, SymbolInfo};

/// One parameter of the generated function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub declarator: String,
    /// Expression passed at the call site.
    pub call_arg: String,
}

/// A typedef generated for an anonymous record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousStruct {
    /// Name the host gave the record (`(anonymous struct at emp.c:4:5)`).
    pub host_name: String,
    /// Generated typedef name.
    pub name: String,
    /// One indented member declaration per line.
    pub fields: String,
}

impl AnonymousStruct {
    pub fn declaration(&self) -> String {
        format!("typedef struct {{\n{}\n}} {};", self.fields, self.name)
    }
}

/// Parameters, local typedefs and the rewritten statement body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamPlan {
    pub params: Vec<Param>,
    pub anonymous: Vec<AnonymousStruct>,
    /// Statement body with host variables renamed to parameter names.
    pub sql_body: String,
    /// Host variables whose type could not be recovered.
    pub unresolved: Vec<SymbolError>,
}

impl ParamPlan {
    pub fn declarators(&self) -> String {
        self.params
            .iter()
            .map(|p| p.declarator.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn call_args(&self) -> String {
        self.params
            .iter()
            .map(|p| p.call_arg.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `EXEC SQL <sql_body>;`
    pub fn exec_sql(&self) -> String {
        format!("EXEC SQL {};", self.sql_body)
    }
}

struct Planner<'a> {
    tu: &'a TranslationUnit,
    function: &'a str,
    func_name: &'a str,
    plan: ParamPlan,
}

impl Planner<'_> {
    fn param_by_arg(&self, call_arg: &str) -> Option<&Param> {
        self.plan.params.iter().find(|p| p.call_arg == call_arg)
    }

    fn unique_name(&self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 2;
        while self.plan.params.iter().any(|p| p.name == name) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    }

    /// Spelling for `ty`, generating a typedef when the record is anonymous.
    fn spelling(&mut self, ty: &CType, var: &str) -> String {
        let (record, pointer) = match ty {
            CType::Record { name, anonymous: true, .. } => (name, false),
            CType::Pointer { pointee } => match pointee.as_ref() {
                CType::Record { name, anonymous: true, .. } => (name, true),
                _ => return ty.spelling(),
            },
            _ => return ty.spelling(),
        };
        let typedef = match self.plan.anonymous.iter().find(|a| &a.host_name == record) {
            Some(existing) => existing.name.clone(),
            None => {
                let name = format!("{}_{}_t", self.func_name, var);
                let fields = find_record(self.tu, record)
                    .map(|r| r.fields.iter().map(field_line).collect::<Vec<_>>().join("\n"))
                    .unwrap_or_default();
                trace!(record = %record, typedef = %name, "declaring anonymous record locally");
                self.plan.anonymous.push(AnonymousStruct {
                    host_name: record.clone(),
                    name: name.clone(),
                    fields,
                });
                name
            }
        };
        if pointer {
            format!("{typedef} *")
        } else {
            typedef
        }
    }

    fn declarator(&mut self, info: &SymbolInfo, name: &str) -> String {
        if info.array.is_some() {
            return info.declarator(name);
        }
        let spelling = self.spelling(&info.ty, name);
        declare(&spelling, name)
    }

    /// Pass `path` on its own; returns the name to use in SQL.
    fn leaf_param(&mut self, path: &HostPath) -> String {
        let call_arg = path.full();
        if let Some(existing) = self.param_by_arg(&call_arg) {
            return existing.name.clone();
        }
        match resolve_path(self.tu, self.function, path) {
            Ok(info) => {
                let name = self.unique_name(path.hostvar());
                let declarator = self.declarator(&info, &name);
                self.plan.params.push(Param {
                    name: name.clone(),
                    declarator,
                    call_arg,
                });
                name
            }
            Err(err) => {
                self.plan.unresolved.push(err);
                call_arg
            }
        }
    }

    /// Pass the record `path` goes through, once.
    fn record_param(&mut self, path: &HostPath) {
        let root = path.root().to_string();
        if self.param_by_arg(&root).is_some() {
            return;
        }
        match resolve_root(self.tu, self.function, path) {
            Ok(info) => {
                let declarator = match &info.ty {
                    CType::Typedef { .. } if info.ty.is_pointer() => declare(&info.type_name, &root),
                    ty if ty.is_pointer() => {
                        let spelling = self.spelling(ty, &root);
                        declare(&spelling, &root)
                    }
                    ty => {
                        let spelling = self.spelling(ty, &root);
                        format!("{spelling} &{root}")
                    }
                };
                self.plan.params.push(Param {
                    name: root.clone(),
                    declarator,
                    call_arg: root,
                });
            }
            Err(err) => self.plan.unresolved.push(err),
        }
    }

    fn path_sql(&mut self, path: &HostPath, simplify: bool) -> String {
        if simplify && path.segments.len() > 1 {
            self.record_param(path);
            path.full()
        } else if simplify {
            self.leaf_param(path);
            path.full()
        } else {
            self.leaf_param(path)
        }
    }
}

fn field_line(field: &FieldDecl) -> String {
    match field.ty.as_constant_array() {
        Some((element, size)) => format!("    {} {}[{size}];", element.spelling(), field.name),
        None => format!("    {};", declare(&field.ty.spelling(), &field.name)),
    }
}

/// Plan the parameters of the function generated for `stmt`.
pub fn plan_params(
    tu: &TranslationUnit,
    function: &str,
    stmt: &ExecSqlStatement,
    simplify: bool,
) -> ParamPlan {
    let func_name = stmt.function_name();
    let mut planner = Planner {
        tu,
        function,
        func_name: &func_name,
        plan: ParamPlan {
            sql_body: stmt.body.clone(),
            ..Default::default()
        },
    };
    if !stmt.kind.takes_arguments() {
        return planner.plan;
    }

    let mut body = stmt.body.clone();
    let mut cursor = 0;
    for list in stmt.host_var_lists() {
        let items: Vec<String> = decode_host_vars(list)
            .into_values()
            .map(|var| {
                let primary = planner.path_sql(&var.primary, simplify);
                match &var.indicator {
                    Some(ind) => format!(":{primary}:{}", planner.path_sql(ind, simplify)),
                    None => format!(":{primary}"),
                }
            })
            .collect();
        let rewritten = items.join(", ");
        if let Some(pos) = body[cursor..].find(list) {
            let start = cursor + pos;
            body.replace_range(start..start + list.len(), &rewritten);
            cursor = start + rewritten.len();
        }
    }
    planner.plan.sql_body = body;
    planner.plan
}
