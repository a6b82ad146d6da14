//! The error taxonomy shared by the parser, the evaluator, and the
//! directory loader. Every variant renders as
//! `<template-name>:<line>:<column>: <message>`.

use thiserror::Error;

use crate::token::Position;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("{template}:{}:{}: {message}", position.0, position.1)]
    Parse {
        template: String,
        position: Position,
        message: String,
    },
    #[error("{template}:{}:{}: {message}", position.0, position.1)]
    Eval {
        template: String,
        position: Position,
        message: String,
    },
    #[error("{template}: {message}")]
    Io { template: String, message: String },
}

impl TemplateError {
    pub fn parse(template: impl Into<String>, position: Position, message: impl Into<String>) -> Self {
        Self::Parse {
            template: template.into(),
            position,
            message: message.into(),
        }
    }

    pub fn eval(template: impl Into<String>, position: Position, message: impl Into<String>) -> Self {
        Self::Eval {
            template: template.into(),
            position,
            message: message.into(),
        }
    }

    pub fn io(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            template: template.into(),
            message: message.into(),
        }
    }
}
