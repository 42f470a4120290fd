// Operator and place evaluation, split out of the expression evaluator

pub mod access;
pub mod binary;
pub mod unary;
