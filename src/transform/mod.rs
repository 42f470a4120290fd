//! Source transformer
//!
//! Turns restricted-language source into the [`Instrumented`] form the
//! executor runs:
//!
//! ```text
//! source → parser → syntax tree → lower + inject → Instrumented
//! ```
//!
//! - [`instrumented`]: the executable form and its script rendering
//! - `lower`: the declaration/pointer/output rewrites and call hoisting
//! - `inject`: pause-point placement and variable tracking
//! - [`diagnostics`]: constructs that could not be rewritten
//!
//! Only tokenization errors make the transform fail outright. Everything else
//! the rewrite cannot express is reported as a [`Diagnostic`] and replaced by
//! a failing operation, so a run proceeds until it actually reaches it.

pub mod diagnostics;
mod inject;
pub mod instrumented;
mod lower;

pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use instrumented::Instrumented;

use crate::interpreter::constants::ENTRY_FUNCTION;
use crate::parser::ast::{FunctionDef, Item, Program};
use crate::parser::{self, ParseError};
use indexmap::IndexMap;
use inject::Injector;
use instrumented::Op;
use rustc_hash::FxHashSet;
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

/// Transform failure
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl TransformError {
    pub fn line(&self) -> usize {
        match self {
            TransformError::Parse(err) => err.location.line,
        }
    }
}

/// Parse and instrument `source`
pub fn transform(source: &str) -> Result<Instrumented, TransformError> {
    let program = parser::parse(source)?;
    Ok(instrument(&program))
}

/// Instrument an already parsed program
pub fn instrument(program: &Program) -> Instrumented {
    let mut diagnostics = Vec::new();

    let mut definitions: IndexMap<String, &FunctionDef> = IndexMap::new();
    for def in program.functions() {
        if definitions.insert(def.name.clone(), def).is_some() {
            diagnostics.push(Diagnostic::new(
                def.location.line,
                DiagnosticKind::DuplicateFunction,
                format!(
                    "Function '{}' is defined more than once; the last definition is used",
                    def.name
                ),
            ));
        }
    }
    let names: FxHashSet<String> = definitions.keys().cloned().collect();

    let mut injector = Injector::new(&names);
    let functions: IndexMap<String, Rc<instrumented::Function>> = definitions
        .values()
        .map(|def| (def.name.clone(), Rc::new(injector.function(def))))
        .collect();

    let statements = program.items.iter().filter_map(|item| match item {
        Item::Statement(stmt) => Some(stmt),
        _ => None,
    });
    let mut top_level = injector.top_level(statements);

    if let Some(entry) = functions.get(ENTRY_FUNCTION) {
        top_level.push(Op::Call {
            dest: None,
            function: ENTRY_FUNCTION.to_string(),
            args: Vec::new(),
            line: entry.line,
        });
    }

    diagnostics.extend(injector.finish());
    diagnostics.sort_by_key(|d| d.line);
    for diagnostic in &diagnostics {
        debug!(%diagnostic, "rewrite diagnostic");
    }

    let instrumented = Instrumented {
        functions,
        top_level: top_level.into(),
        diagnostics,
    };
    debug!(
        functions = instrumented.functions.len(),
        pauses = instrumented.pauses().len(),
        "program instrumented"
    );
    instrumented
}

#[cfg(test)]
mod tests {
    use super::instrumented::Expr;
    use super::*;

    fn pause_lines(source: &str) -> Vec<usize> {
        transform(source)
            .unwrap()
            .pauses()
            .into_iter()
            .map(|(line, _)| line)
            .collect()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const BRANCH: &str = "\
int main() {
    int x = 10;
    if (x > 5) {
        x = 15;
    } else {
        cout << \"small\" << endl;
    }
}";

    #[test]
    fn test_branch_pause_layout() {
        let program = transform(BRANCH).unwrap();
        let main = program.function("main").unwrap();

        assert!(matches!(&main.body[0], Op::Let { name, .. } if name == "x"));
        assert_eq!(
            main.body[1],
            Op::Pause {
                line: 2,
                capture: names(&["x"])
            }
        );
        let Op::If {
            then_ops, else_ops, ..
        } = &main.body[2]
        else {
            panic!("Expected if, got {:?}", main.body[2]);
        };
        assert_eq!(
            then_ops[0],
            Op::Pause {
                line: 3,
                capture: names(&["x"])
            }
        );
        assert_eq!(
            then_ops[2],
            Op::Pause {
                line: 4,
                capture: names(&["x"])
            }
        );
        assert_eq!(
            else_ops[0],
            Op::Pause {
                line: 5,
                capture: names(&["x"])
            }
        );
        // the else block's `}` stands alone, the then block's does not
        assert_eq!(
            else_ops.last(),
            Some(&Op::Pause {
                line: 7,
                capture: Vec::new()
            })
        );
        assert_eq!(
            main.body.last(),
            Some(&Op::Pause {
                line: 8,
                capture: Vec::new()
            })
        );
    }

    #[test]
    fn test_entry_call_appended() {
        let program = transform(BRANCH).unwrap();
        assert!(matches!(
            program.top_level.last(),
            Some(Op::Call { function, dest: None, .. }) if function == "main"
        ));
        assert!(program.to_string().ends_with("await main();\n"));
    }

    #[test]
    fn test_no_entry_call_without_main() {
        let program = transform("int helper() {\n return 1;\n}\nint g = 3;\n").unwrap();
        assert!(!program
            .top_level
            .iter()
            .any(|op| matches!(op, Op::Call { .. })));
        assert_eq!(program.pauses(), vec![(3, Vec::new()), (4, names(&["g"]))]);
    }

    #[test]
    fn test_every_tracked_name_is_captured() {
        let program = transform("int main() {\n int a = 1;\n int b = 2;\n a = 3;\n}").unwrap();
        let pauses = program.pauses();
        assert_eq!(pauses[0], (2, names(&["a"])));
        assert_eq!(pauses[1], (3, names(&["a", "b"])));
        assert_eq!(pauses[2], (4, names(&["a", "b"])));
    }

    #[test]
    fn test_parameters_seed_tracking() {
        let program =
            transform("int add(int a, int b) {\n int s = a + b;\n return s;\n}").unwrap();
        assert_eq!(program.pauses()[0], (2, names(&["a", "b", "s"])));
        let add = program.function("add").unwrap();
        assert_eq!(add.params, names(&["a", "b"]));
    }

    #[test]
    fn test_tracking_resets_per_function() {
        let program = transform(
            "void f(int p) {\n int q = p;\n}\nint main() {\n int r = 1;\n}",
        )
        .unwrap();
        let pauses = program.pauses();
        assert_eq!(pauses[0], (2, names(&["p", "q"])));
        assert_eq!(pauses[2], (5, names(&["r"])));
    }

    #[test]
    fn test_one_line_if_pauses_once() {
        assert_eq!(
            pause_lines("int main() {\n int x = 1;\n if (x > 0) x = 2;\n}"),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn test_unbraced_body_on_next_line() {
        let program = transform("int main() {\n int x = 1;\n if (x > 0)\n  x = 2;\n}").unwrap();
        let main = program.function("main").unwrap();
        let Op::If { then_ops, .. } = &main.body[2] else {
            panic!("Expected if");
        };
        assert!(matches!(then_ops[0], Op::Pause { line: 3, .. }));
        assert!(matches!(then_ops[2], Op::Pause { line: 4, .. }));
    }

    #[test]
    fn test_else_if_has_no_extra_header() {
        let source = "\
int main() {
    int x = 3;
    if (x > 5) {
        x = 1;
    } else if (x > 2) {
        x = 2;
    }
}";
        let program = transform(source).unwrap();
        let main = program.function("main").unwrap();
        let Op::If { else_ops, .. } = &main.body[2] else {
            panic!("Expected if");
        };
        // the nested if is the first op of the else branch
        let Op::If { then_ops, .. } = &else_ops[0] else {
            panic!("Expected nested if, got {:?}", else_ops[0]);
        };
        assert!(matches!(then_ops[0], Op::Pause { line: 5, .. }));
    }

    #[test]
    fn test_while_loop_shape() {
        let source = "\
int main() {
    int i = 0;
    while (i < 3) {
        i++;
    }
}";
        let program = transform(source).unwrap();
        let main = program.function("main").unwrap();
        let Op::Loop { body, step, .. } = &main.body[2] else {
            panic!("Expected loop");
        };
        assert!(step.is_empty());
        assert!(matches!(&body[0], Op::If { then_ops, .. } if matches!(then_ops[0], Op::Break { .. })));
        assert!(matches!(body[1], Op::Pause { line: 3, .. }));
        assert!(matches!(body[3], Op::Pause { line: 4, .. }));
        assert!(matches!(body[4], Op::Pause { line: 5, .. }));
    }

    #[test]
    fn test_for_loop_scope_and_step() {
        let source = "\
int main() {
    int total = 0;
    for (int i = 0; i < 3; i++) {
        total += i;
    }
}";
        let program = transform(source).unwrap();
        let main = program.function("main").unwrap();
        let Op::Scope { body } = &main.body[2] else {
            panic!("Expected for scope");
        };
        assert!(matches!(&body[0], Op::Let { name, .. } if name == "i"));
        let Op::Loop { step, .. } = &body[1] else {
            panic!("Expected loop");
        };
        assert!(matches!(&step[0], Op::Eval { expr: Expr::IncDec { .. }, .. }));
        // the loop variable is not tracked
        assert_eq!(program.pauses()[1], (3, names(&["total"])));
    }

    #[test]
    fn test_no_pause_after_return() {
        assert_eq!(
            pause_lines("int f() {\n return 1;\n}\nint main() {\n int x = f();\n}"),
            vec![3, 5, 6]
        );
    }

    #[test]
    fn test_multiple_declarators_pause_once() {
        let program = transform("int main() {\n int a = 1, b = 2;\n}").unwrap();
        assert_eq!(program.pauses()[0], (2, names(&["a", "b"])));
        assert_eq!(program.pauses().len(), 2);
    }

    #[test]
    fn test_unsupported_statement_reported() {
        let program = transform("int main() {\n int x = 1;\n cin >> x;\n}").unwrap();
        assert!(program.has_errors());
        assert_eq!(program.diagnostics[0].line, 3);
        assert_eq!(program.diagnostics[0].kind, DiagnosticKind::ParseFailure);
        let main = program.function("main").unwrap();
        assert!(main.body.iter().any(|op| matches!(op, Op::Fail { line: 3, .. })));
    }

    #[test]
    fn test_duplicate_function_last_wins() {
        let program = transform("int f() {\n return 1;\n}\nint f() {\n return 2;\n}").unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.function("f").unwrap().line, 4);
        assert_eq!(
            program.diagnostics[0].kind,
            DiagnosticKind::DuplicateFunction
        );
    }

    #[test]
    fn test_lex_error_is_fatal() {
        let err = transform("int main() {\n int x = 1 | 2;\n}").unwrap_err();
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_render_function() {
        let program = transform("int add(int a, int b) {\n return a + b;\n}").unwrap();
        let text = program.function("add").unwrap().to_string();
        assert!(text.starts_with("async function add(a, b) {\n"));
        assert!(text.contains("  return a + b;\n"));
        assert!(text.contains("  await pause(3, {});\n"));
    }
}
