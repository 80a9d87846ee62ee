//! End-to-end runs of the rewriter over small Pro*C outputs.

use std::path::Path;

use proc_modernize_core::{apply_fixits, Diagnostic, SourcePos, SourceRange, Span};
use proc_modernize_rules::config::keys;
use proc_modernize_rules::host::{
    Assignment, CType, CallExpr, DeclContext, ExprFact, FieldDecl, FunctionDecl, MacroExpansion,
    MacroToken, NamedDecl, RecordDecl, RecordTag, SqlstmBlock, TokenKind, VarDecl,
};
use proc_modernize_rules::{codes, ConfigFile, ExecSqlRewriter, OptionValue, TranslationUnit};

// ─────────────────────── Helpers ───────────────────────

const SQLSTM: &str = "struct sqlexd sqlstm;";

/// Spans of every `{ ... struct sqlexd sqlstm; ... }` block.
fn sqlstm_spans(buffer: &str) -> Vec<Span> {
    buffer
        .match_indices(SQLSTM)
        .map(|(at, _)| {
            let open = buffer[..at].rfind('{').unwrap();
            let close = at + buffer[at..].find('}').unwrap();
            Span::new(open as u32, close as u32 + 1)
        })
        .collect()
}

fn unit(dir: &Path, buffer: &str, function: FunctionDecl) -> TranslationUnit {
    TranslationUnit {
        main_file: dir.join("emp.c").to_string_lossy().into_owned(),
        buffer: buffer.to_string(),
        sqlstm_blocks: sqlstm_spans(buffer)
            .into_iter()
            .map(|span| SqlstmBlock {
                function: function.name.clone(),
                span,
            })
            .collect(),
        functions: vec![function],
        ..Default::default()
    }
}

fn func(name: &str, vars: Vec<(&str, CType)>) -> FunctionDecl {
    FunctionDecl {
        name: name.into(),
        start_line: 1,
        end_line: 100,
        context: DeclContext {
            decls: vars
                .into_iter()
                .map(|(n, ty)| NamedDecl::Var(VarDecl { name: n.into(), ty, line: 0 }))
                .collect(),
            nested: vec![],
        },
    }
}

fn record(name: &str, anonymous: bool, fields: Vec<(&str, CType)>) -> NamedDecl {
    NamedDecl::Record(RecordDecl {
        name: name.into(),
        tag: RecordTag::Struct,
        anonymous,
        fields: fields
            .into_iter()
            .map(|(n, ty)| FieldDecl { name: n.into(), ty })
            .collect(),
        nested: DeclContext::default(),
    })
}

fn range(line: u32, begin: u32, end_line: u32, end: u32) -> SourceRange {
    SourceRange::new(SourcePos::new(line, begin), SourcePos::new(end_line, end))
}

fn config(dir: &Path, options: Vec<(&str, OptionValue)>) -> ConfigFile {
    let mut cfg = ConfigFile::default();
    cfg.check_options.insert(
        keys::GENERATION_DIRECTORY.into(),
        OptionValue::Str(format!("{}/gen/%B", dir.display())),
    );
    for (key, value) in options {
        cfg.check_options.insert(key.into(), value);
    }
    cfg
}

fn with_code<'a>(diags: &'a [Diagnostic], code: &str) -> Vec<&'a Diagnostic> {
    diags.iter().filter(|d| d.code == code).collect()
}

fn read(dir: &Path, file: &str) -> String {
    std::fs::read_to_string(dir.join("gen/emp").join(file)).unwrap()
}

// ─────────────────────── Scenarios ───────────────────────

const ALLOCATE: &str = "\
int main() {
/* EXEC SQL ALLOCATE   :emp_cv ; */

{
    struct sqlexd sqlstm;
}
}
";

#[test]
fn test_allocate() {
    let tmp = tempfile::tempdir().unwrap();
    let tu = unit(tmp.path(), ALLOCATE, func("main", vec![]));
    let diags = ExecSqlRewriter::new(config(tmp.path(), vec![])).run(&tu);

    assert_eq!(diags.len(), 1, "{diags:?}");
    let rewrite = &diags[0];
    assert_eq!(rewrite.code, codes::REWRITE);
    assert!(rewrite.is_warning());
    assert_eq!(rewrite.fixits[0].replacement, "allocateEmp_cv();");
    assert_eq!(
        apply_fixits(&tu.buffer, &rewrite.fixits).unwrap(),
        "int main() {\n/* EXEC SQL ALLOCATE   :emp_cv ; */\n\nallocateEmp_cv();\n}\n"
    );

    let header = read(tmp.path(), "allocateEmp_cv.h");
    assert!(header.contains("#ifndef ALLOCATEEMP_CV_H"));
    assert!(header.contains("void allocateEmp_cv();"));
    let source = read(tmp.path(), "allocateEmp_cv.pc");
    assert!(source.contains("    EXEC SQL ALLOCATE :emp_cv;"));
}

#[test]
fn test_declare_cursor_comment_below_block() {
    let tmp = tempfile::tempdir().unwrap();
    let buffer = "\
int main() {
{
    /* EXEC SQL DECLARE cEmp CURSOR FOR reqEmp ; */
    struct sqlexd sqlstm;
}
}
";
    let tu = unit(tmp.path(), buffer, func("main", vec![]));
    let diags = ExecSqlRewriter::new(config(tmp.path(), vec![])).run(&tu);

    let rewrites = with_code(&diags, codes::REWRITE);
    assert_eq!(rewrites.len(), 1, "{diags:?}");
    assert_eq!(rewrites[0].fixits[0].replacement, "declareCEmp();");
    assert!(read(tmp.path(), "declareCEmp.h").contains("void declareCEmp();"));
    assert!(read(tmp.path(), "declareCEmp.pc").contains("EXEC SQL DECLARE cEmp CURSOR FOR reqEmp;"));
}

#[test]
fn test_prepare_formatted() {
    let tmp = tempfile::tempdir().unwrap();
    let buffer = "\
#define REQ_FMT \"select %s from t where id=%d\"
void run() {
    char buf[256];
    char tmp[256];
    sprintf(tmp, REQ_FMT, a, b);
    buf = tmp;
    /* EXEC SQL PREPARE s FROM :buf ; */

    {
        struct sqlexd sqlstm;
    }
}
";
    let chars = |n| CType::array(CType::builtin("char"), n);
    let mut tu = unit(
        tmp.path(),
        buffer,
        func(
            "run",
            vec![
                ("buf", chars(256)),
                ("tmp", chars(256)),
                ("a", chars(32)),
                ("b", CType::builtin("int")),
            ],
        ),
    );
    tu.macro_expansions.push(MacroExpansion {
        name: "REQ_FMT".into(),
        usage: range(5, 18, 5, 25),
        definition: range(1, 1, 1, 47),
        tokens: vec![MacroToken {
            kind: TokenKind::StringLiteral,
            text: "\"select %s from t where id=%d\"".into(),
            range: range(1, 17, 1, 47),
        }],
        in_main_file: true,
    });
    tu.calls.push(CallExpr {
        function: "run".into(),
        line: 5,
        callee: "sprintf".into(),
        args: vec![
            ExprFact::var("tmp"),
            ExprFact::macro_use("REQ_FMT"),
            ExprFact::var("a"),
            ExprFact::var("b"),
        ],
    });
    tu.assignments.push(Assignment {
        function: "run".into(),
        line: 6,
        lhs: ExprFact::var("buf"),
        rhs: ExprFact::var("tmp"),
    });

    let diags = ExecSqlRewriter::new(config(tmp.path(), vec![])).run(&tu);
    assert!(diags.iter().all(|d| !d.is_error()), "{diags:?}");
    let rewrites = with_code(&diags, codes::REWRITE);
    assert_eq!(rewrites.len(), 1, "{diags:?}");
    assert_eq!(rewrites[0].fixits[0].replacement, "prepareS(a, b);");

    assert!(read(tmp.path(), "prepareS.h").contains("void prepareS(const char a[32], int b);"));
    let source = read(tmp.path(), "prepareS.pc");
    assert!(source.contains("#ifndef REQ_FMT\n#define REQ_FMT \"select %s from t where id=%d\"\n#endif"));
    assert!(source.contains("void prepareS(const char a[32], int b)\n{\n"));
    assert!(source.contains(
        "    char tmp[256];\n    char buf[256];\n    sprintf(tmp, REQ_FMT, a, b);\n    strcpy(buf, tmp);\n    EXEC SQL PREPARE s FROM :buf;\n"
    ));
}

fn fetch_unit(dir: &Path, statement: &str) -> TranslationUnit {
    const ANON: &str = "(anonymous struct at emp.c:4:5)";
    let buffer = format!(
        "void load() {{\n    /* EXEC SQL {statement} */\n\n    {{\n        struct sqlexd sqlstm;\n    }}\n}}\n"
    );
    let mut tu = unit(
        dir,
        &buffer,
        func(
            "load",
            vec![
                ("rec", CType::pointer(CType::record("emp"))),
                ("indRec", CType::pointer(CType::anonymous_record(ANON))),
                ("age", CType::builtin("int")),
            ],
        ),
    );
    tu.context.decls = vec![
        record(
            "emp",
            false,
            vec![
                ("name", CType::array(CType::builtin("char"), 32)),
                ("id", CType::builtin("int")),
            ],
        ),
        record(ANON, true, vec![("ind", CType::builtin("short"))]),
    ];
    tu
}

#[test]
fn test_fetch_leaf_parameters() {
    let tmp = tempfile::tempdir().unwrap();
    let tu = fetch_unit(tmp.path(), "FETCH c INTO :rec->name:indRec->ind, :age ;");
    let diags = ExecSqlRewriter::new(config(tmp.path(), vec![])).run(&tu);

    let rewrites = with_code(&diags, codes::REWRITE);
    assert_eq!(rewrites.len(), 1, "{diags:?}");
    assert_eq!(rewrites[0].fixits[0].replacement, "fetchC(rec->name, indRec->ind, age);");
    assert!(read(tmp.path(), "fetchC.h").contains("void fetchC(char name[32], short ind, int age);"));
    assert!(read(tmp.path(), "fetchC.pc").contains("    EXEC SQL FETCH c INTO :name:ind, :age;"));
}

#[test]
fn test_fetch_simplified_arguments() {
    let tmp = tempfile::tempdir().unwrap();
    let tu = fetch_unit(tmp.path(), "FETCH c INTO :rec->name:indRec->ind, :rec->id, :age ;");
    let cfg = config(
        tmp.path(),
        vec![(keys::SIMPLIFY_FUNCTION_ARGS, OptionValue::Str("1".into()))],
    );
    let diags = ExecSqlRewriter::new(cfg).run(&tu);

    let rewrites = with_code(&diags, codes::REWRITE);
    assert_eq!(rewrites.len(), 1, "{diags:?}");
    assert_eq!(rewrites[0].fixits[0].replacement, "fetchC(rec, indRec, age);");
    let header = read(tmp.path(), "fetchC.h");
    assert!(header.contains("typedef struct {\n    short ind;\n} fetchC_indRec_t;\n"));
    assert!(header.contains("void fetchC(struct emp *rec, fetchC_indRec_t *indRec, int age);"));
    assert!(read(tmp.path(), "fetchC.pc")
        .contains("EXEC SQL FETCH c INTO :rec->name:indRec->ind, :rec->id, :age;"));
}

#[test]
fn test_lob_read_references_length_macro() {
    let tmp = tempfile::tempdir().unwrap();
    let buffer = "\
#define SZ 4000
void rd() {
    dst.len = SZ;
    /* EXEC SQL LOB READ :len FROM :src INTO :dst WITH LENGTH :max ; */

    {
        struct sqlexd sqlstm;
    }
}
";
    let mut tu = unit(
        tmp.path(),
        buffer,
        func(
            "rd",
            vec![
                ("len", CType::builtin("unsigned int")),
                ("src", CType::pointer(CType::builtin("OCIBlobLocator"))),
                ("dst", CType::record("lobbuf")),
                ("max", CType::builtin("unsigned int")),
            ],
        ),
    );
    tu.macro_expansions.push(MacroExpansion {
        name: "SZ".into(),
        usage: range(3, 15, 3, 17),
        definition: range(1, 1, 1, 16),
        tokens: vec![MacroToken {
            kind: TokenKind::NumericConstant,
            text: "4000".into(),
            range: range(1, 12, 1, 16),
        }],
        in_main_file: true,
    });
    tu.assignments.push(Assignment {
        function: "rd".into(),
        line: 3,
        lhs: ExprFact {
            text: "dst.len".into(),
            decl_ref: Some("dst".into()),
            member: Some("len".into()),
            ..Default::default()
        },
        rhs: ExprFact::macro_use("SZ"),
    });

    let diags = ExecSqlRewriter::new(config(tmp.path(), vec![])).run(&tu);
    let rewrites = with_code(&diags, codes::REWRITE);
    assert_eq!(rewrites.len(), 1, "{diags:?}");
    assert_eq!(rewrites[0].fixits[0].replacement, "lobReadSrcDst(len, src, dst, max);");

    let source = read(tmp.path(), "lobReadSrcDst.pc");
    assert!(source.contains("#ifndef SZ\n#define SZ 4000\n#endif"));
    assert!(source.contains("    dst.len = SZ;\n"));
    assert!(!source.contains("= 4000;"));
}

#[test]
fn test_lob_read_with_sample_template() {
    let tmp = tempfile::tempdir().unwrap();
    let buffer = "\
#define SZ 4000
void rd() {
    dst.len = SZ;
    /* EXEC SQL LOB READ :len FROM :src INTO :dst ; */

    {
        struct sqlexd sqlstm;
    }
}
";
    let mut tu = unit(
        tmp.path(),
        buffer,
        func("rd", vec![("dst", CType::record("lobbuf"))]),
    );
    tu.macro_expansions.push(MacroExpansion {
        name: "SZ".into(),
        usage: range(3, 15, 3, 17),
        definition: range(1, 1, 1, 16),
        tokens: vec![MacroToken {
            kind: TokenKind::NumericConstant,
            text: "4000".into(),
            range: range(1, 12, 1, 16),
        }],
        in_main_file: true,
    });
    tu.assignments.push(Assignment {
        function: "rd".into(),
        line: 3,
        lhs: ExprFact {
            text: "dst.len".into(),
            decl_ref: Some("dst".into()),
            member: Some("len".into()),
            ..Default::default()
        },
        rhs: ExprFact::macro_use("SZ"),
    });
    let template = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates/lob-read.pc.tmpl");
    let cfg = config(
        tmp.path(),
        vec![(
            "proc-exec-sql-lob-read.Generation-source-template",
            OptionValue::Str(template.to_string_lossy().into_owned()),
        )],
    );
    let diags = ExecSqlRewriter::new(cfg).run(&tu);

    // len and src are not declared
    assert_eq!(with_code(&diags, codes::UNRESOLVED_HOST_VAR).len(), 2, "{diags:?}");
    let source = read(tmp.path(), "lobReadSrcDst.pc");
    assert!(source.contains("    dst.len = SZ;\n    EXEC SQL LOB READ :len FROM :src INTO :dst;\n"));
    assert!(source.contains("#define SZ 4000"));
}

const PATCH_PC: &str = "   /* original comment */\n   EXEC SQL\n      FETCH c INTO :a;\n";

fn patch_unit(dir: &Path) -> TranslationUnit {
    let pc = dir.join("emp.pc");
    let buffer = format!(
        "void f() {{\n    /* EXEC SQL\n          FETCH c INTO :a; */\n#line 2 \"{pc}\"\n#line 3 \"{pc}\"\n\n{{\n    struct sqlexd sqlstm;\n}}\n}}\n",
        pc = pc.display()
    );
    unit(dir, &buffer, func("f", vec![]))
}

#[test]
fn test_patch_line_range() {
    let tmp = tempfile::tempdir().unwrap();
    let pc = tmp.path().join("emp.pc");
    std::fs::write(&pc, PATCH_PC).unwrap();
    let tu = patch_unit(tmp.path());
    let cfg = config(
        tmp.path(),
        vec![(keys::REPORT_MODIFICATION_IN_PC, OptionValue::Bool(true))],
    );
    let diags = ExecSqlRewriter::new(cfg).run(&tu);

    // `a` is not declared in the unit: its parameter is elided
    assert_eq!(with_code(&diags, codes::UNRESOLVED_HOST_VAR).len(), 1, "{diags:?}");
    let rewrites = with_code(&diags, codes::REWRITE);
    assert_eq!(rewrites.len(), 1, "{diags:?}");
    assert_eq!(rewrites[0].fixits[0].replacement, "fetchC();");
    assert!(with_code(&diags, codes::PATCH).is_empty(), "{diags:?}");

    assert_eq!(
        std::fs::read_to_string(&pc).unwrap(),
        "   /* original comment */\n   fetchC();\n   \n"
    );
    let backup = tmp.path().join("emp.pc.bak");
    assert_eq!(std::fs::read_to_string(backup).unwrap(), PATCH_PC);
    assert!(read(tmp.path(), "fetchC.h").contains(&format!("Generated from {}:2", pc.display())));
}

#[test]
fn test_patch_rerun_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let pc = tmp.path().join("emp.pc");
    std::fs::write(&pc, PATCH_PC).unwrap();
    let tu = patch_unit(tmp.path());
    let cfg = config(
        tmp.path(),
        vec![
            (keys::REPORT_MODIFICATION_IN_PC, OptionValue::Bool(true)),
            (keys::ALLOW_OVERWRITE, OptionValue::Bool(true)),
        ],
    );
    let mut rewriter = ExecSqlRewriter::new(cfg);
    rewriter.run(&tu);
    let once = std::fs::read_to_string(&pc).unwrap();

    let diags = rewriter.run(&tu);
    assert_eq!(std::fs::read_to_string(&pc).unwrap(), once);
    assert_eq!(with_code(&diags, codes::PATCH).len(), 1, "{diags:?}");
    assert!(!tmp.path().join("emp.pc-0.bak").exists());
}

#[test]
fn test_patch_mixed_rule_options_share_one_pc() {
    let tmp = tempfile::tempdir().unwrap();
    let pc = tmp.path().join("emp.pc");
    let original = " EXEC SQL CLOSE c1;\n x = 1;\n EXEC SQL FETCH c2 INTO :a;\n y = 2;\n";
    std::fs::write(&pc, original).unwrap();
    let buffer = format!(
        "void f() {{\n    /* EXEC SQL CLOSE c1 ; */\n#line 1 \"{pc}\"\n\n{{\n    struct sqlexd sqlstm;\n}}\n    /* EXEC SQL FETCH c2 INTO :a ; */\n#line 3 \"{pc}\"\n\n{{\n    struct sqlexd sqlstm;\n}}\n}}\n",
        pc = pc.display()
    );
    let tu = unit(tmp.path(), &buffer, func("f", vec![]));
    let close_keeps = format!("proc-exec-sql-close.{}", keys::KEEP_COMMENTED_OUT_EXEC_SQL);
    let cfg = config(
        tmp.path(),
        vec![
            (keys::REPORT_MODIFICATION_IN_PC, OptionValue::Bool(true)),
            (close_keeps.as_str(), OptionValue::Bool(true)),
        ],
    );
    let diags = ExecSqlRewriter::new(cfg).run(&tu);

    let fixes: Vec<&str> = with_code(&diags, codes::REWRITE)
        .iter()
        .map(|d| d.fixits[0].replacement.as_str())
        .collect();
    assert_eq!(fixes, ["closeC1();", "fetchC2();"], "{diags:?}");
    assert!(with_code(&diags, codes::PATCH).is_empty(), "{diags:?}");
    assert_eq!(
        std::fs::read_to_string(&pc).unwrap(),
        " /* EXEC SQL CLOSE c1; */\n closeC1();\n x = 1;\n fetchC2();\n y = 2;\n"
    );
    assert_eq!(std::fs::read_to_string(tmp.path().join("emp.pc.bak")).unwrap(), original);
    assert!(!tmp.path().join("emp.pc-0.bak").exists());
}

// ─────────────────────── Failure Handling ───────────────────────

#[test]
fn test_existing_artefacts_block_the_fixit() {
    let tmp = tempfile::tempdir().unwrap();
    let tu = unit(tmp.path(), ALLOCATE, func("main", vec![]));
    let mut rewriter = ExecSqlRewriter::new(config(tmp.path(), vec![]));
    assert_eq!(with_code(&rewriter.run(&tu), codes::REWRITE).len(), 1);

    let diags = rewriter.run(&tu);
    assert!(with_code(&diags, codes::REWRITE).is_empty());
    let errors = with_code(&diags, codes::GENERATION);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].is_error());
    assert!(errors[0].fixits.is_empty());
}

#[test]
fn test_disabled_rule_is_silent() {
    let tmp = tempfile::tempdir().unwrap();
    let tu = unit(tmp.path(), ALLOCATE, func("main", vec![]));
    let mut cfg = config(tmp.path(), vec![]);
    cfg.checks = vec!["proc-exec-sql-fetch".into()];
    let diags = ExecSqlRewriter::new(cfg).run(&tu);
    assert!(diags.is_empty(), "{diags:?}");
    assert!(!tmp.path().join("gen").exists());
}

#[test]
fn test_unrecognized_comment() {
    let tmp = tempfile::tempdir().unwrap();
    let buffer = "int main() {\n/* nothing to see */\n\n{\n    struct sqlexd sqlstm;\n}\n}\n";
    let tu = unit(tmp.path(), buffer, func("main", vec![]));
    let diags = ExecSqlRewriter::new(config(tmp.path(), vec![])).run(&tu);
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code, codes::UNRECOGNIZED_STATEMENT);
    assert_eq!(diags[0].location.as_ref().map(|l| l.line), Some(4));
}

#[test]
fn test_next_declare_comment_is_not_adopted() {
    let tmp = tempfile::tempdir().unwrap();
    let buffer = "int main() {\n/* EXEC SQL CLOSE c1 ; */\n\n{ struct sqlexd sqlstm; }\n/* EXEC SQL DECLARE c2 CURSOR FOR s ; */\n}\n";
    let tu = unit(tmp.path(), buffer, func("main", vec![]));
    let diags = ExecSqlRewriter::new(config(tmp.path(), vec![])).run(&tu);

    let rewrites = with_code(&diags, codes::REWRITE);
    assert_eq!(rewrites.len(), 1, "{diags:?}");
    assert_eq!(rewrites[0].fixits[0].replacement, "closeC1();");
    assert!(!tmp.path().join("gen/emp/declareC2.h").exists());
}

#[test]
fn test_declare_comment_above_block_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let buffer = "int main() {\n/* EXEC SQL DECLARE c2 CURSOR FOR s ; */\n\n{\n    struct sqlexd sqlstm;\n}\n}\n";
    let tu = unit(tmp.path(), buffer, func("main", vec![]));
    let diags = ExecSqlRewriter::new(config(tmp.path(), vec![])).run(&tu);
    assert_eq!(diags.len(), 1, "{diags:?}");
    assert_eq!(diags[0].code, codes::COMMENT_NOT_FOUND);
    assert!(diags[0].fixits.is_empty());
}

#[test]
fn test_malformed_groups_disable_grouping() {
    let tmp = tempfile::tempdir().unwrap();
    let groups = tmp.path().join("groups.json");
    std::fs::write(&groups, "[not json").unwrap();
    let tu = unit(tmp.path(), ALLOCATE, func("main", vec![]));
    let cfg = config(
        tmp.path(),
        vec![(
            keys::REQUEST_GROUPS,
            OptionValue::Str(groups.to_string_lossy().into_owned()),
        )],
    );
    let mut rewriter = ExecSqlRewriter::new(cfg);
    let diags = rewriter.run(&tu);
    assert_eq!(with_code(&diags, codes::CONFIGURATION).len(), 1, "{diags:?}");
    assert_eq!(with_code(&diags, codes::REWRITE).len(), 1);

    std::fs::remove_dir_all(tmp.path().join("gen")).unwrap();
    let again = rewriter.run(&tu);
    assert!(with_code(&again, codes::CONFIGURATION).is_empty());
}

#[test]
fn test_facts_from_json() {
    let tmp = tempfile::tempdir().unwrap();
    let main_file = tmp.path().join("emp.c");
    let open = ALLOCATE.rfind("\n{").unwrap() + 1;
    let close = ALLOCATE.find("}\n}").unwrap() + 1;
    let json = serde_json::json!({
        "main_file": main_file,
        "buffer": ALLOCATE,
        "functions": [{ "name": "main" }],
        "sqlstm_blocks": [{ "function": "main", "span": { "start": open, "end": close } }],
    });
    let tu = TranslationUnit::from_json(&json.to_string()).unwrap();
    assert_eq!(tu.sqlstm_blocks[0].span, sqlstm_spans(ALLOCATE)[0]);
    let diags = ExecSqlRewriter::new(config(tmp.path(), vec![])).run(&tu);
    assert_eq!(with_code(&diags, codes::REWRITE).len(), 1, "{diags:?}");
}
