// Resumable execution engine for instrumented programs

use crate::containers::ContainerTable;
use crate::interpreter::constants::{DEFAULT_MAX_CALL_DEPTH, DEFAULT_STEP_BUDGET, ROOT_FRAME_NAME};
use crate::interpreter::env::Env;
use crate::interpreter::errors::RuntimeError;
use crate::interpreter::ops::binary::evaluate_binary_op;
use crate::memory::value::Value;
use crate::memory::Memory;
use crate::snapshot::OutputLog;
use crate::transform::instrumented::{Block, Expr, Op};
use crate::transform::Instrumented;
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::{debug, trace};

/// Execution limits applied between two pause points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Operations allowed between two pauses
    pub step_budget: usize,
    /// Nested calls allowed below the root activation
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            step_budget: DEFAULT_STEP_BUDGET,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

/// What a call to [`Machine::resume`] stopped at
#[derive(Debug, Clone, PartialEq)]
pub enum Yield {
    /// A pause point was reached
    Paused {
        line: usize,
        variables: IndexMap<String, Value>,
    },
    /// The program ran to completion
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopNext {
    Body,
    Step,
}

/// Position inside one activation
#[derive(Debug, Clone)]
enum Cursor {
    Block { ops: Block, pc: usize, scoped: bool },
    Loop { body: Block, step: Block, next: LoopNext },
}

/// One function activation (the root activation runs top-level code)
#[derive(Debug, Clone)]
struct Activation {
    function: String,
    pub(crate) env: Env,
    cursors: Vec<Cursor>,
    /// Caller temporary receiving the return value
    dest: Option<String>,
}

impl Activation {
    fn new(function: &str, env: Env, body: Block, dest: Option<String>) -> Self {
        Activation {
            function: function.to_string(),
            env,
            cursors: vec![Cursor::Block {
                ops: body,
                pc: 0,
                scoped: false,
            }],
            dest,
        }
    }

    fn enter(&mut self, ops: Block) {
        self.env.push_scope();
        self.cursors.push(Cursor::Block {
            ops,
            pc: 0,
            scoped: true,
        });
    }

    /// Unwind to the innermost loop; `exit` leaves it, otherwise it moves on to the step
    fn unwind_to_loop(&mut self, exit: bool) -> bool {
        loop {
            match self.cursors.last_mut() {
                None => return false,
                Some(Cursor::Loop { next, .. }) => {
                    if exit {
                        self.cursors.pop();
                    } else {
                        *next = LoopNext::Step;
                    }
                    return true;
                }
                Some(Cursor::Block { scoped, .. }) => {
                    let scoped = *scoped;
                    self.cursors.pop();
                    if scoped {
                        self.env.pop_scope();
                    }
                }
            }
        }
    }
}

/// Next thing the run loop has to do
enum Next {
    Run(Block, usize),
    LeaveBlock { scoped: bool },
    Enter(Block),
    FunctionEnd,
}

/// The resumable executor
///
/// Runs the instrumented form one operation at a time and returns control at
/// every [`Op::Pause`]. All continuation state lives in explicit cursors, so
/// resuming is just calling [`Machine::resume`] again.
pub struct Machine {
    program: Rc<Instrumented>,
    activations: Vec<Activation>,
    pub(crate) containers: ContainerTable,
    limits: Limits,
    current_line: usize,
    finished: bool,
}

impl Machine {
    /// Prepare a run; pushes the root frame onto `memory`
    pub fn new(program: Rc<Instrumented>, limits: Limits, memory: &mut Memory) -> Self {
        memory.push_frame(ROOT_FRAME_NAME);
        let root = Activation::new(
            ROOT_FRAME_NAME,
            Env::new(),
            Rc::clone(&program.top_level),
            None,
        );
        Machine {
            program,
            activations: vec![root],
            containers: ContainerTable::new(),
            limits,
            current_line: 0,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of user-function activations above the root
    pub fn call_depth(&self) -> usize {
        self.activations.len().saturating_sub(1)
    }

    /// Run until the next pause point or the end of the program
    pub fn resume(&mut self, memory: &mut Memory, output: &mut OutputLog) -> Result<Yield, RuntimeError> {
        if self.finished {
            return Ok(Yield::Finished);
        }

        let mut steps = 0usize;
        loop {
            match self.next_action() {
                Next::Run(ops, index) => {
                    self.charge_step(&mut steps)?;
                    let op = &ops[index];
                    if let Some(line) = op.line() {
                        self.current_line = line;
                    }
                    if let Some(yielded) = self.execute(op, memory, output)? {
                        return Ok(yielded);
                    }
                }
                Next::LeaveBlock { scoped } => {
                    if let Some(activation) = self.activations.last_mut() {
                        activation.cursors.pop();
                        if scoped {
                            activation.env.pop_scope();
                        }
                    }
                }
                Next::Enter(ops) => {
                    // Entering a loop body or step counts even when it is empty
                    self.charge_step(&mut steps)?;
                    if let Some(activation) = self.activations.last_mut() {
                        activation.enter(ops);
                    }
                }
                Next::FunctionEnd => {
                    if let Some(yielded) = self.return_from_call(Value::Undefined, memory) {
                        return Ok(yielded);
                    }
                }
            }
        }
    }

    fn charge_step(&self, steps: &mut usize) -> Result<(), RuntimeError> {
        *steps += 1;
        if *steps > self.limits.step_budget {
            return Err(RuntimeError::StepBudgetExceeded {
                budget: self.limits.step_budget,
                line: self.current_line,
            });
        }
        Ok(())
    }

    fn next_action(&mut self) -> Next {
        let Some(activation) = self.activations.last_mut() else {
            return Next::FunctionEnd;
        };
        match activation.cursors.last_mut() {
            None => Next::FunctionEnd,
            Some(Cursor::Block { ops, pc, scoped }) => {
                if *pc >= ops.len() {
                    Next::LeaveBlock { scoped: *scoped }
                } else {
                    *pc += 1;
                    Next::Run(Rc::clone(ops), *pc - 1)
                }
            }
            Some(Cursor::Loop { body, step, next }) => match *next {
                LoopNext::Body => {
                    *next = LoopNext::Step;
                    Next::Enter(Rc::clone(body))
                }
                LoopNext::Step => {
                    *next = LoopNext::Body;
                    Next::Enter(Rc::clone(step))
                }
            },
        }
    }

    fn execute(&mut self, op: &Op, memory: &mut Memory, output: &mut OutputLog) -> Result<Option<Yield>, RuntimeError> {
        match op {
            Op::Let { name, init, line } => {
                let value = match init {
                    Some(init) => self.evaluate(init, memory, *line)?,
                    None => Value::Undefined,
                };
                self.activation_mut().env.declare(name.clone(), value);
            }

            Op::Assign {
                place,
                op,
                value,
                line,
            } => {
                let mut value = self.evaluate(value, memory, *line)?;
                let slot = self.resolve_place(place, memory, *line)?;
                if let Some(op) = op {
                    let current = self.read_slot(&slot, memory, *line)?;
                    value = evaluate_binary_op(*op, &current, &value, *line)?;
                }
                self.write_slot(&slot, value, memory, *line)?;
            }

            Op::Eval { expr, line } => {
                self.evaluate(expr, memory, *line)?;
            }

            Op::Call {
                dest,
                function,
                args,
                line,
            } => self.call(function, args, dest.clone(), memory, *line)?,

            Op::Print { args, line } => {
                let mut text = String::new();
                for arg in args {
                    let value = self.evaluate(arg, memory, *line)?;
                    text.push_str(&value.to_string());
                }
                trace!(line, %text, "print");
                output.push(*line, text);
            }

            Op::Free { target, line } => {
                let value = self.evaluate(target, memory, *line)?;
                let address = memory
                    .expect_address(&value)
                    .map_err(|err| RuntimeError::memory(err, *line))?;
                if let Some(address) = address {
                    memory.free(address).map_err(|err| RuntimeError::memory(err, *line))?;
                }
            }

            Op::If {
                condition,
                then_ops,
                else_ops,
                line,
            } => {
                let taken = if self.evaluate(condition, memory, *line)?.is_truthy() {
                    then_ops
                } else {
                    else_ops
                };
                if !taken.is_empty() {
                    self.activation_mut().enter(Rc::clone(taken));
                }
            }

            Op::Loop { body, step, .. } => {
                self.activation_mut().cursors.push(Cursor::Loop {
                    body: Rc::clone(body),
                    step: Rc::clone(step),
                    next: LoopNext::Body,
                });
            }

            Op::Break { line } => {
                if !self.activation_mut().unwind_to_loop(true) {
                    return Err(RuntimeError::OutsideLoop {
                        keyword: "break",
                        line: *line,
                    });
                }
            }

            Op::Continue { line } => {
                if !self.activation_mut().unwind_to_loop(false) {
                    return Err(RuntimeError::OutsideLoop {
                        keyword: "continue",
                        line: *line,
                    });
                }
            }

            Op::Return { value, line } => {
                let value = match value {
                    Some(value) => self.evaluate(value, memory, *line)?,
                    None => Value::Undefined,
                };
                return Ok(self.return_from_call(value, memory));
            }

            Op::Pause { line, capture } => {
                let variables: IndexMap<String, Value> = capture
                    .iter()
                    .map(|name| (name.clone(), self.lookup(name).cloned().unwrap_or_default()))
                    .collect();
                memory.update_variables(variables.clone());
                memory.set_line(*line);
                debug!(line, variables = variables.len(), "pause");
                return Ok(Some(Yield::Paused {
                    line: *line,
                    variables,
                }));
            }

            Op::Fail { line, message } => {
                return Err(RuntimeError::Unsupported {
                    message: message.clone(),
                    line: *line,
                })
            }

            Op::Scope { body } => self.activation_mut().enter(Rc::clone(body)),
        }
        Ok(None)
    }

    fn call(
        &mut self,
        function: &str,
        args: &[Expr],
        dest: Option<String>,
        memory: &mut Memory,
        line: usize,
    ) -> Result<(), RuntimeError> {
        let callee = self
            .program
            .function(function)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedFunction {
                name: function.to_string(),
                line,
            })?;

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate(arg, memory, line)?);
        }

        if self.call_depth() >= self.limits.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                depth: self.limits.max_call_depth,
                line,
            });
        }

        // Missing arguments read as undefined, extra ones are dropped
        let mut env = Env::new();
        let mut values = values.into_iter();
        for param in &callee.params {
            env.declare(param.clone(), values.next().unwrap_or_default());
        }

        memory.push_frame(&callee.name);
        debug!(function = %callee.name, depth = self.call_depth() + 1, "call");
        self.activations
            .push(Activation::new(&callee.name, env, Rc::clone(&callee.body), dest));
        Ok(())
    }

    /// Pop the active function; at the root this ends the program
    fn return_from_call(&mut self, value: Value, memory: &mut Memory) -> Option<Yield> {
        if self.activations.len() <= 1 {
            self.finish(memory);
            return Some(Yield::Finished);
        }

        let activation = self.activations.pop()?;
        memory.pop_frame();
        debug!(function = %activation.function, %value, "return");
        if let Some(dest) = activation.dest {
            self.activation_mut().env.declare(dest, value);
        }
        None
    }

    fn finish(&mut self, memory: &mut Memory) {
        self.activations.clear();
        memory.pop_frame();
        self.finished = true;
        debug!("program finished");
    }

    fn activation_mut(&mut self) -> &mut Activation {
        // The root activation outlives every operation that runs
        let last = self.activations.len() - 1;
        &mut self.activations[last]
    }

    /// Resolve a name in the active function, then among the globals
    pub(crate) fn lookup(&self, name: &str) -> Option<&Value> {
        let current = self.activations.last()?;
        current.env.get(name).or_else(|| {
            if self.activations.len() > 1 {
                self.activations[0].env.get(name)
            } else {
                None
            }
        })
    }

    pub(crate) fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        let top = self.activations.len().checked_sub(1)?;
        let index = if self.activations[top].env.contains(name) {
            top
        } else {
            0
        };
        self.activations[index].env.get_mut(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform;

    struct Run {
        machine: Machine,
        memory: Memory,
        output: OutputLog,
    }

    fn start(source: &str, limits: Limits) -> Run {
        let program = Rc::new(transform(source).unwrap());
        let mut memory = Memory::default();
        let machine = Machine::new(program, limits, &mut memory);
        Run {
            machine,
            memory,
            output: OutputLog::new(),
        }
    }

    impl Run {
        fn resume(&mut self) -> Result<Yield, RuntimeError> {
            self.machine.resume(&mut self.memory, &mut self.output)
        }

        /// Collect every pause until the program ends
        fn drain(&mut self) -> Result<Vec<(usize, IndexMap<String, Value>)>, RuntimeError> {
            let mut pauses = Vec::new();
            loop {
                match self.resume()? {
                    Yield::Paused { line, variables } => pauses.push((line, variables)),
                    Yield::Finished => return Ok(pauses),
                }
            }
        }
    }

    fn run_all(source: &str) -> Result<Vec<(usize, IndexMap<String, Value>)>, RuntimeError> {
        start(source, Limits::default()).drain()
    }

    fn var(pause: &(usize, IndexMap<String, Value>), name: &str) -> Value {
        pause.1.get(name).cloned().unwrap_or_default()
    }

    #[test]
    fn test_branch_scenario() {
        let pauses = run_all(
            "int main() {\n int x = 10;\n if (x > 5) {\n  x = 15;\n } else {\n  cout << \"small\" << endl;\n }\n}",
        )
        .unwrap();
        let lines: Vec<usize> = pauses.iter().map(|p| p.0).collect();
        assert_eq!(lines, vec![2, 3, 4, 8]);
        assert_eq!(var(&pauses[0], "x"), Value::Int(10));
        assert_eq!(var(&pauses[1], "x"), Value::Int(10));
        assert_eq!(var(&pauses[2], "x"), Value::Int(15));
        assert!(pauses[3].1.is_empty());
    }

    #[test]
    fn test_frames_follow_calls() {
        let mut run = start(
            "int sq(int n) {\n int r = n * n;\n return r;\n}\nint main() {\n int a = sq(3);\n}",
            Limits::default(),
        );
        let Yield::Paused { line, variables } = run.resume().unwrap() else {
            panic!("expected a pause");
        };
        assert_eq!(line, 2);
        assert_eq!(variables.get("r"), Some(&Value::Int(9)));
        let frames = run.memory.snapshot_stack();
        let names: Vec<&str> = frames.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["global", "main", "sq"]);

        let Yield::Paused { line, variables } = run.resume().unwrap() else {
            panic!("expected a pause");
        };
        assert_eq!(line, 6);
        assert_eq!(variables.get("a"), Some(&Value::Int(9)));
        assert_eq!(run.memory.depth(), 2);
    }

    #[test]
    fn test_finish_pops_root_and_keeps_heap() {
        let mut run = start("int main() {\n Node* p = new Node();\n}", Limits::default());
        run.drain().unwrap();
        assert!(run.machine.is_finished());
        assert_eq!(run.memory.depth(), 0);
        assert_eq!(run.memory.snapshot_heap().len(), 1);
        assert_eq!(run.resume(), Ok(Yield::Finished));
    }

    #[test]
    fn test_loops_break_and_continue() {
        let source = "\
int main() {
    int total = 0;
    for (int i = 0; i < 10; i++) {
        if (i == 2) continue;
        if (i == 5) break;
        total += i;
    }
}";
        let pauses = run_all(source).unwrap();
        let last = pauses.last().unwrap();
        assert_eq!(last.0, 8);
        let before_close = &pauses[pauses.len() - 2];
        assert_eq!(var(before_close, "total"), Value::Int(8));
    }

    #[test]
    fn test_while_scopes_are_undone() {
        let source = "\
int main() {
    int n = 0;
    while (n < 3) {
        int t = n;
        n = t + 1;
    }
}";
        let pauses = run_all(source).unwrap();
        let close = &pauses[pauses.len() - 1];
        assert_eq!(close.0, 7);
        let last_body = pauses.iter().rev().find(|p| p.0 == 5).unwrap();
        assert_eq!(var(last_body, "n"), Value::Int(3));
    }

    #[test]
    fn test_recursion() {
        let source = "\
int fact(int n) {
    if (n <= 1) return 1;
    return n * fact(n - 1);
}
int main() {
    int f = fact(5);
}";
        let pauses = run_all(source).unwrap();
        let assigned = pauses.iter().find(|p| p.0 == 6).unwrap();
        assert_eq!(var(assigned, "f"), Value::Int(120));
    }

    #[test]
    fn test_print_collects_output() {
        let mut run = start(
            "int main() {\n int x = 4;\n cout << \"x = \" << x << endl;\n}",
            Limits::default(),
        );
        run.drain().unwrap();
        assert_eq!(run.output.texts(), vec!["x = 4"]);
        assert_eq!(run.output.lines[0].line, 3);
    }

    #[test]
    fn test_undefined_variable_reports_line() {
        let err = run_all("int main() {\n int x = 1;\n x = y + 1;\n}").unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UndefinedVariable {
                name: "y".to_string(),
                line: 3
            }
        );
    }

    #[test]
    fn test_undeclared_assignment() {
        let err = run_all("int main() {\n z = 3;\n}").unwrap_err();
        assert!(matches!(err, RuntimeError::UndeclaredAssignment { line: 2, .. }));
    }

    #[test]
    fn test_step_budget() {
        let limits = Limits {
            step_budget: 50,
            ..Limits::default()
        };
        let mut run = start("int main() {\n int i = 0;\n while (true) { i++; }\n}", limits);
        run.resume().unwrap();
        let err = run.resume().unwrap_err();
        assert!(matches!(err, RuntimeError::StepBudgetExceeded { budget: 50, .. }));
    }

    #[test]
    fn test_empty_loops_hit_step_budget() {
        let limits = Limits {
            step_budget: 50,
            ..Limits::default()
        };
        for source in ["int main() {\n for (;;) {}\n}", "int main() {\n for (;;);\n}"] {
            let err = start(source, limits).drain().unwrap_err();
            assert!(
                matches!(err, RuntimeError::StepBudgetExceeded { budget: 50, .. }),
                "{}: {:?}",
                source,
                err
            );
        }
    }

    #[test]
    fn test_huge_arrays_are_rejected() {
        let err = run_all("int main() {\n int a[4611686018427387903];\n}").unwrap_err();
        assert!(matches!(err, RuntimeError::ArrayTooLarge { line: 2, .. }));

        let err = run_all("int main() {\n int a[3];\n a[4611686018427387903] = 1;\n}").unwrap_err();
        assert!(matches!(err, RuntimeError::ArrayTooLarge { line: 3, .. }));
    }

    #[test]
    fn test_element_place_evaluated_once() {
        let pauses = run_all(
            "int main() {\n int a[] = {1, 2, 3};\n int i = 0;\n a[i++] += 5;\n a[i++]++;\n}",
        )
        .unwrap();
        assert_eq!(var(&pauses[2], "i"), Value::Int(1));
        assert_eq!(
            var(&pauses[2], "a"),
            Value::Array(vec![Value::Int(6), Value::Int(2), Value::Int(3)])
        );
        assert_eq!(var(&pauses[3], "i"), Value::Int(2));
        assert_eq!(
            var(&pauses[3], "a"),
            Value::Array(vec![Value::Int(6), Value::Int(3), Value::Int(3)])
        );
    }

    #[test]
    fn test_call_depth() {
        let limits = Limits {
            max_call_depth: 8,
            ..Limits::default()
        };
        let err = start("int f(int n) { return f(n + 1); }\nint main() { f(0); }", limits)
            .drain()
            .unwrap_err();
        assert!(matches!(err, RuntimeError::CallDepthExceeded { depth: 8, .. }));
    }

    #[test]
    fn test_unsupported_fails_when_reached() {
        let mut run = start("int main() {\n int x = 1;\n int* p = &x;\n}", Limits::default());
        assert!(matches!(run.resume(), Ok(Yield::Paused { line: 2, .. })));
        let err = run.resume().unwrap_err();
        assert!(matches!(err, RuntimeError::Unsupported { line: 3, .. }));
    }

    #[test]
    fn test_top_level_globals_visible_in_functions() {
        let pauses = run_all("int g = 5;\nint main() {\n int y = g + 1;\n}").unwrap();
        assert_eq!(pauses[0].0, 1);
        assert_eq!(var(&pauses[1], "y"), Value::Int(6));
    }
}
