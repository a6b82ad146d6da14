use lucent::{Environment, Value};

#[test]
fn break_stops_the_enclosing_loop_after_the_current_iteration() {
    let mut env = Environment::new();
    env.add_template("t", "{% for v in xs %}{{ v }}{% break %}{% endfor %}");
    env.set_variable(
        "xs",
        Value::sequence(vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
    );

    assert_eq!(env.render("t").as_deref(), Some("1"));
}

#[test]
fn break_inside_a_nested_if_only_stops_the_enclosing_loop() {
    let mut env = Environment::new();
    env.add_template(
        "t",
        "{% for v in xs %}{{ v }}{% if v %}{% break %}{% endif %}{% endfor %}after",
    );
    env.set_variable(
        "xs",
        Value::sequence(vec![Value::Int(1), Value::Int(2)]),
    );

    assert_eq!(env.render("t").as_deref(), Some("1after"));
}
