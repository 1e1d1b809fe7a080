//! Pseudo-source rendering of bodies, statements, and expressions.
//!
//! Output is fully parenthesized and precedence-naive; it exists for CLI
//! output and test diagnostics, not for the round-trip pretty-printer.

use crate::expr::{Expression, Literal};
use crate::stmt::{BasicStatement, Compound, CompoundStatement, Target};
use std::fmt::{self, Write as _};

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Bool(v) => write!(f, "{v}"),
            Literal::Char(v) => write!(f, "'{v}'"),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(e) => write!(f, "{}", e.value),
            Expression::Variable(e) => write!(f, "{}", e.variable.id),
            Expression::Member(e) => write!(f, "{}.{}", e.object, e.member),
            Expression::Unary(e) => write!(f, "{}{}", e.op.as_str(), e.operand),
            Expression::Binary(e) => write!(f, "({} {} {})", e.left, e.op.as_str(), e.right),
            Expression::Ternary(e) => {
                write!(f, "({} ? {} : {})", e.condition, e.then_value, e.else_value)
            }
            Expression::Coercion(e) => write!(f, "({}) {}", e.ty.as_str(), e.value),
            Expression::Invocation(e) => {
                write!(f, "{}.{}(", e.target, e.method)?;
                fmt_arguments(f, &e.arguments)?;
                write!(f, ")")
            }
            Expression::Allocation(e) => {
                write!(f, "new {}(", e.class)?;
                fmt_arguments(f, &e.arguments)?;
                write!(f, ")")
            }
        }
    }
}

fn fmt_arguments(f: &mut fmt::Formatter<'_>, arguments: &[Expression]) -> fmt::Result {
    for (i, arg) in arguments.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Variable(v) => write!(f, "{}", v.id),
            Target::Member { object, member, .. } => write!(f, "{object}.{member}"),
        }
    }
}

impl fmt::Display for BasicStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BasicStatement::Assignment { target, value } => write!(f, "{target} = {value};"),
            BasicStatement::Declaration { variables } => {
                let mut first = true;
                for variable in variables {
                    if first {
                        write!(f, "{} {}", variable.ty.as_str(), variable.id)?;
                        first = false;
                    } else {
                        write!(f, ", {}", variable.id)?;
                    }
                }
                write!(f, ";")
            }
            BasicStatement::Expression { value } => write!(f, "{value};"),
        }
    }
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        fmt_compound(&mut out, self, 0)?;
        f.write_str(&out)
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("    ");
    }
}

fn fmt_compound(out: &mut String, compound: &Compound, depth: usize) -> fmt::Result {
    for statement in &compound.statements {
        match statement {
            CompoundStatement::Basic(block) => {
                for basic in &block.statements {
                    indent(out, depth);
                    writeln!(out, "{basic}")?;
                }
            }
            CompoundStatement::If(s) => {
                for basic in &s.condition.block.statements {
                    indent(out, depth);
                    writeln!(out, "{basic}")?;
                }
                indent(out, depth);
                writeln!(out, "if ({}) {{", s.condition.condition)?;
                fmt_compound(out, &s.then_branch, depth + 1)?;
                if !s.else_branch.is_empty() {
                    indent(out, depth);
                    writeln!(out, "}} else {{")?;
                    fmt_compound(out, &s.else_branch, depth + 1)?;
                }
                indent(out, depth);
                writeln!(out, "}}")?;
            }
            CompoundStatement::While(s) => {
                for basic in &s.condition.block.statements {
                    indent(out, depth);
                    writeln!(out, "{basic}")?;
                }
                indent(out, depth);
                writeln!(out, "while ({}) {{", s.condition.condition)?;
                fmt_compound(out, &s.body, depth + 1)?;
                indent(out, depth);
                writeln!(out, "}}")?;
            }
            CompoundStatement::Return(s) => {
                for basic in &s.value.block.statements {
                    indent(out, depth);
                    writeln!(out, "{basic}")?;
                }
                indent(out, depth);
                writeln!(out, "return {};", s.value.condition)?;
            }
        }
    }
    Ok(())
}
