// End-to-end tests driving a Session through run/advance/reset

use logiclens::interpreter::RuntimeError;
use logiclens::memory::value::Value;
use logiclens::memory::AccessPolicy;
use logiclens::scheduler::{SchedulerState, Update};
use logiclens::snapshot::Snapshot;
use logiclens::{Session, SessionConfig};
use std::cell::RefCell;
use std::rc::Rc;

fn run_to_end(source: &str) -> (Session, Vec<Snapshot>) {
    let mut session = Session::default();
    session.run(source).expect("Transform failed");
    let pauses = session.run_to_end();
    (session, pauses)
}

fn var(snapshot: &Snapshot, name: &str) -> Value {
    snapshot.variables.get(name).cloned().unwrap_or_default()
}

#[test]
fn test_branch_scenario() {
    let source = r#"int main() {
    int x = 10;
    if (x > 5) {
        x = 15;
    } else {
        cout << "small" << endl;
    }
}"#;
    let (session, pauses) = run_to_end(source);

    let lines: Vec<Option<usize>> = pauses.iter().map(|p| p.line).collect();
    assert_eq!(lines, vec![Some(2), Some(3), Some(4), Some(8)]);
    assert_eq!(var(&pauses[0], "x"), Value::Int(10));
    assert_eq!(var(&pauses[1], "x"), Value::Int(10));
    assert_eq!(var(&pauses[2], "x"), Value::Int(15));
    assert!(pauses[3].variables.is_empty());

    assert!(session.output().is_empty());
    assert_eq!(session.state(), SchedulerState::Idle);
    assert_eq!(session.snapshot().line, None);
}

#[test]
fn test_stack_container_scenario() {
    let source = r#"int main() {
    stack<int> s;
    s.push(10);
    s.push(20);
    s.push(30);
    s.pop();
}"#;
    let (_, pauses) = run_to_end(source);
    let after_pop = pauses.iter().find(|p| p.line == Some(6)).expect("no pause after pop");

    let stacks: Vec<_> = after_pop.objects_of_type("Stack").collect();
    assert_eq!(stacks.len(), 1);
    let (_, object) = stacks[0];
    assert_eq!(
        object.fields.get("items"),
        Some(&Value::Array(vec![Value::Int(10), Value::Int(20)]))
    );
    assert_eq!(object.fields.get("size"), Some(&Value::Int(2)));
}

#[test]
fn test_pointer_link_scenario() {
    let source = r#"struct Node {
    int val;
    Node* next;
};

int main() {
    Node* a = new Node();
    Node* b = new Node();
    a->next = b;
    Node* c = a->next;
}"#;
    let (_, pauses) = run_to_end(source);
    let last = pauses.iter().find(|p| p.line == Some(10)).expect("no pause at line 10");

    let a = var(last, "a").as_address().expect("a is not an address");
    let b = var(last, "b");
    assert!(b.is_pointer());
    assert_eq!(last.heap[&a].fields.get("next"), Some(&b));
    assert_eq!(var(last, "c"), b);
}

#[test]
fn test_declarations_pause_once_each() {
    let source = "int main() {\n int a = 1;\n double d = 2.5;\n a = 7;\n bool f = true;\n}";
    let (_, pauses) = run_to_end(source);

    assert_eq!(pauses.len(), 5);
    assert_eq!(pauses[0].variables.len(), 1);
    assert_eq!(pauses[1].variables.len(), 2);
    // untouched variables are still reported
    assert_eq!(var(&pauses[2], "d"), Value::Float(2.5));
    assert_eq!(var(&pauses[2], "a"), Value::Int(7));
    assert_eq!(var(&pauses[3], "f"), Value::Bool(true));
    assert_eq!(pauses[3].variables.len(), 3);
}

#[test]
fn test_allocations_are_distinct_and_free_is_permissive() {
    let source = r#"int main() {
    Node* p = new Node();
    Node* q = new Node();
    p->val = 1;
    delete p;
    int v = p->val;
}"#;
    let (session, pauses) = run_to_end(source);
    assert!(session.scheduler().last_error().is_none());

    let p = var(&pauses[1], "p").as_address().unwrap();
    let q = var(&pauses[1], "q").as_address().unwrap();
    assert!(q > p);

    let after = pauses.iter().find(|s| s.line == Some(6)).unwrap();
    assert_eq!(var(after, "v"), Value::Undefined);
    assert!(!after.heap.contains_key(&p));
}

#[test]
fn test_strict_policy_reports_use_after_free() {
    let source = "int main() {\n Node* p = new Node();\n delete p;\n int v = p->val;\n}";
    let mut session = Session::new(SessionConfig {
        access_policy: AccessPolicy::Strict,
        ..SessionConfig::default()
    });
    session.run(source).unwrap();
    session.run_to_end();

    let error = session.scheduler().last_error().expect("expected an error");
    assert!(matches!(error, RuntimeError::Memory { line: 4, .. }));
    assert_eq!(session.state(), SchedulerState::Idle);
}

#[test]
fn test_reset_while_paused() {
    let updates = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&updates);

    let mut session = Session::default();
    session.subscribe(move |update: &Update| sink.borrow_mut().push(update.clone()));
    session
        .run("int main() {\n Node* n = new Node();\n n->val = 3;\n}")
        .unwrap();
    assert!(session.is_running());

    session.reset();
    assert_eq!(session.state(), SchedulerState::Aborted);
    assert!(session.snapshot().variables.is_empty());
    assert!(session.snapshot().heap.is_empty());
    assert!(session.scheduler().pause_token().is_none());

    // advancing a reset session does nothing
    session.advance();
    assert_eq!(updates.borrow().last(), Some(&Update::Reset));
}

#[test]
fn test_nested_calls_pause_in_order() {
    let source = r#"int twice(int v) {
    int w = v * 2;
    return w;
}

int add(int a, int b) {
    int s = twice(a) + b;
    return s;
}

int main() {
    int r = add(1, 2);
    cout << "r = " << r << endl;
}"#;
    let (session, pauses) = run_to_end(source);
    let lines: Vec<usize> = pauses.iter().filter_map(|p| p.line).collect();
    assert_eq!(lines, vec![2, 7, 12, 13, 14]);

    assert_eq!(pauses[0].stack.len(), 4);
    assert_eq!(pauses[0].stack[3].name, "twice");
    assert_eq!(var(&pauses[1], "s"), Value::Int(4));
    assert_eq!(var(&pauses[2], "r"), Value::Int(4));
    assert_eq!(session.output().texts(), vec!["r = 4"]);
}

#[test]
fn test_queue_order() {
    let source = r#"int main() {
    queue<int> q;
    q.push(1);
    q.push(2);
    q.push(3);
    int first = q.front();
    q.pop();
    int next = q.front();
    int last = q.back();
}"#;
    let (_, pauses) = run_to_end(source);
    let end = pauses.iter().find(|p| p.line == Some(9)).unwrap();
    assert_eq!(var(end, "first"), Value::Int(1));
    assert_eq!(var(end, "next"), Value::Int(2));
    assert_eq!(var(end, "last"), Value::Int(3));
}

#[test]
fn test_runtime_error_ends_run() {
    let updates = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&updates);

    let mut session = Session::default();
    session.subscribe(move |update: &Update| sink.borrow_mut().push(update.clone()));
    session.run("int main() {\n int x = 4;\n int y = x / 0;\n}").unwrap();
    session.run_to_end();

    assert_eq!(session.state(), SchedulerState::Idle);
    let updates = updates.borrow();
    let Some(Update::Failed { error, .. }) = updates.last() else {
        panic!("expected a failure, got {:?}", updates.last());
    };
    assert_eq!(error.to_string(), "Division by zero at line 3");
}

#[test]
fn test_empty_container_error() {
    let (session, _) = run_to_end("int main() {\n queue<int> q;\n int v = q.front();\n}");
    let error = session.scheduler().last_error().unwrap();
    assert_eq!(error.to_string(), "Queue is empty at line 3");
}

#[test]
fn test_rerun_after_finish_starts_fresh() {
    let mut session = Session::default();
    session.run("int main() {\n Node* n = new Node();\n}").unwrap();
    session.run_to_end();
    assert_eq!(session.snapshot().heap.len(), 1);

    session.run("int main() {\n int k = 1;\n}").unwrap();
    assert_eq!(session.snapshot().line, Some(2));
    assert!(session.snapshot().heap.is_empty());
}
