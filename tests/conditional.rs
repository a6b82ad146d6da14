use lucent::{Environment, Value};

const TEMPLATE: &str = "{% if foo > bar %}Yes{% elif baz %}Maybe{% else %}No{% endif %}";

#[test]
fn else_branch_when_condition_and_elif_are_both_false() {
    let mut env = Environment::new();
    env.add_template("t", TEMPLATE);
    env.set_variable("foo", Value::Int(10));
    env.set_variable("bar", Value::Int(20));
    assert_eq!(env.render("t").as_deref(), Some("No"));
}

#[test]
fn elif_branch_wins_over_else() {
    let mut env = Environment::new();
    env.add_template("t", TEMPLATE);
    env.set_variable("foo", Value::Int(10));
    env.set_variable("bar", Value::Int(20));
    env.set_variable("baz", Value::Int(69));
    assert_eq!(env.render("t").as_deref(), Some("Maybe"));
}

#[test]
fn if_branch_wins_when_condition_is_true() {
    let mut env = Environment::new();
    env.add_template("t", TEMPLATE);
    env.set_variable("foo", Value::Int(420));
    env.set_variable("bar", Value::Int(20));
    env.set_variable("baz", Value::Int(69));
    assert_eq!(env.render("t").as_deref(), Some("Yes"));
}
