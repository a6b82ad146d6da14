use lucent::{Environment, Value};

#[test]
fn loop_index_and_item_are_bound_each_iteration() {
    let mut env = Environment::new();
    env.add_template("t", "{% for v in foo %}{{ loop.index }}{{ v }}{% endfor %}");
    env.set_variable(
        "foo",
        Value::sequence(vec![Value::str("hello"), Value::str("world")]),
    );

    assert_eq!(env.render("t").as_deref(), Some("0hello1world"));
}

#[test]
fn loop_over_mapping_binds_values_not_keys() {
    use indexmap::IndexMap;
    use std::rc::Rc;

    let mut env = Environment::new();
    env.add_template("t", "{% for v in foo %}{{ v }}{% endfor %}");

    let mut foo = IndexMap::new();
    foo.insert(Rc::from("a"), Value::Int(1));
    foo.insert(Rc::from("b"), Value::Int(2));
    env.set_variable("foo", Value::mapping(foo));

    assert_eq!(env.render("t").as_deref(), Some("12"));
}

#[test]
fn outer_loop_variable_is_restored_after_the_loop() {
    let mut env = Environment::new();
    env.add_template(
        "t",
        "{{ v }}{% for v in xs %}{{ v }}{% endfor %}{{ v }}",
    );
    env.set_variable("v", Value::str("outer"));
    env.set_variable("xs", Value::sequence(vec![Value::Int(1)]));

    assert_eq!(env.render("t").as_deref(), Some("outer1outer"));
}
