//! A small Jinja-style text template engine: lexer, AST, parser, and a
//! tree-walking evaluator with inheritance via `{% extends %}`/`{% block %}`.
//!
//! ```
//! use lucent::{Environment, Value};
//!
//! let mut env = Environment::new();
//! env.add_template("greeting", "hello, {{ name }}!");
//! env.set_variable("name", Value::str("world"));
//! assert_eq!(env.render("greeting").as_deref(), Some("hello, world!"));
//! ```

pub mod ast;
pub mod env;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod value;

pub use env::Environment;
pub use error::TemplateError;
pub use value::Value;
