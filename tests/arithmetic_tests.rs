use logiclens::memory::value::Value;
use logiclens::Session;

fn final_values(source: &str) -> Vec<(String, Value)> {
    let mut session = Session::default();
    session.run(source).expect("Transform failed");
    let pauses = session.run_to_end();
    assert!(
        session.scheduler().last_error().is_none(),
        "Execution failed: {:?}",
        session.scheduler().last_error()
    );

    // the last pause that still reports variables
    let last = pauses
        .iter()
        .rev()
        .find(|p| !p.variables.is_empty())
        .expect("no variables reported");
    last.variables
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn value_of(values: &[(String, Value)], name: &str) -> Value {
    values
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

#[test]
fn test_arithmetic_coercion() {
    let source = r#"int main() {
    char c = 'a';
    int sum = c + 10;
    int diff = 10 - c;
    int quot = c / 2;
    double half = 7 / 2.0;
    int trunc = 7 / 2;
    int rem = -7 % 3;
}"#;
    let values = final_values(source);
    assert_eq!(value_of(&values, "sum"), Value::Int(107));
    assert_eq!(value_of(&values, "diff"), Value::Int(-87));
    assert_eq!(value_of(&values, "quot"), Value::Int(48));
    assert_eq!(value_of(&values, "half"), Value::Float(3.5));
    assert_eq!(value_of(&values, "trunc"), Value::Int(3));
    assert_eq!(value_of(&values, "rem"), Value::Int(-1));
}

#[test]
fn test_compound_assignment_and_increments() {
    let source = r#"int main() {
    int n = 5;
    n += 3;
    n *= 2;
    n -= 1;
    int post = n++;
    int pre = ++n;
}"#;
    let values = final_values(source);
    assert_eq!(value_of(&values, "post"), Value::Int(15));
    assert_eq!(value_of(&values, "pre"), Value::Int(17));
    assert_eq!(value_of(&values, "n"), Value::Int(17));
}

#[test]
fn test_string_concatenation_output() {
    let mut session = Session::default();
    session
        .run("int main() {\n string s = \"ab\";\n cout << s + \"c\" << \" \" << 1 + 2 << endl;\n}")
        .unwrap();
    session.run_to_end();
    assert_eq!(session.output().texts(), vec!["abc 3"]);
}

#[test]
fn test_short_circuit_skips_calls() {
    let source = r#"int hits = 0;
bool touch() {
    hits = hits + 1;
    return true;
}
int main() {
    bool a = false && touch();
    bool b = true || touch();
    bool c = true && touch();
}"#;
    let mut session = Session::default();
    session.run(source).unwrap();
    let pauses = session.run_to_end();
    let end = pauses.iter().rev().find(|p| p.line == Some(9)).unwrap();
    assert_eq!(end.variables.get("c"), Some(&Value::Bool(true)));
    // only the third declaration reached touch()
    let touched: Vec<_> = pauses.iter().filter(|p| p.line == Some(3)).collect();
    assert_eq!(touched.len(), 1);
    assert_eq!(touched[0].variables.get("hits"), Some(&Value::Int(1)));
}

#[test]
fn test_arrays_and_loops() {
    let source = r#"int main() {
    int nums[4];
    int total = 0;
    for (int i = 0; i < 4; i++) {
        nums[i] = i * i;
    }
    for (int j = 0; j < 4; j++) {
        total += nums[j];
    }
}"#;
    let values = final_values(source);
    assert_eq!(value_of(&values, "total"), Value::Int(14));
    assert_eq!(
        value_of(&values, "nums"),
        Value::Array(vec![Value::Int(0), Value::Int(1), Value::Int(4), Value::Int(9)])
    );
}
