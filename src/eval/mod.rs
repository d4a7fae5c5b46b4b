//! AST evaluation against a base image.
//!
//! A single deterministic post-order walk: literals resolve to scalars and
//! colours, `input` resolves to the base image, operators apply the typed
//! semantics from [`ops`]. The root of each statement that evaluates to an
//! image becomes one named layer; statements whose root is a scalar or
//! colour produce no layer (so a program like `1 + 1` composites to the
//! default canvas).

pub mod ops;

use std::collections::HashMap;

use crate::error::{IqError, Result};
use crate::parser::{BinaryOp, Expr, Program, Statement, UnaryOp};
use crate::types::{Layer, PixelBuffer, Value};

/// Evaluate a parsed program against the base image into ordered layers.
pub fn evaluate(base: &PixelBuffer, program: &Program) -> Result<Vec<Layer>> {
    let mut evaluator = Evaluator::new(base);
    let mut layers = Vec::new();

    for (index, statement) in program.statements.iter().enumerate() {
        if let Some(layer) = evaluator.eval_statement(statement, index)? {
            layers.push(layer);
        }
    }

    Ok(layers)
}

/// Tree-walking evaluator with the layer-binding environment.
pub struct Evaluator<'a> {
    base: &'a PixelBuffer,
    bindings: HashMap<String, PixelBuffer>,
}

impl<'a> Evaluator<'a> {
    pub fn new(base: &'a PixelBuffer) -> Self {
        Self {
            base,
            bindings: HashMap::new(),
        }
    }

    /// Evaluate one statement; image-valued roots become a layer.
    fn eval_statement(&mut self, statement: &Statement, index: usize) -> Result<Option<Layer>> {
        let value = self.eval_expr(&statement.expr)?;

        let buffer = match value {
            Value::Image(buffer) => buffer,
            other => {
                if statement.has_metadata() {
                    return Err(IqError::Eval {
                        message: format!(
                            "layer metadata on a statement that produces a {}, not an image",
                            other.kind()
                        ),
                        help: Some(
                            "only image-valued statements become layers; drop the clause or \
                             make the expression produce an image"
                                .to_string(),
                        ),
                    });
                }
                return Ok(None);
            }
        };

        let name = statement
            .name
            .clone()
            .unwrap_or_else(|| format!("layer{}", index));
        if name == "input" || self.bindings.contains_key(&name) {
            return Err(IqError::Eval {
                message: format!("layer '{}' is already defined", name),
                help: None,
            });
        }
        self.bindings.insert(name.clone(), buffer.clone());

        Ok(Some(Layer {
            name,
            buffer,
            opacity: statement.opacity.unwrap_or(1.0),
            mode: statement.mode.unwrap_or_default(),
            z: statement.z.unwrap_or(index as i32),
        }))
    }

    /// Post-order evaluation of one expression node.
    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Number(n) => Ok(Value::Scalar(*n)),
            Expr::Colour(c) => Ok(Value::Colour(*c)),
            Expr::Ref(name) => self.eval_ref(name),
            Expr::Unary { op, expr } => {
                let value = self.eval_expr(expr)?;
                self.eval_unary(*op, value)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval_expr(lhs)?;
                let rhs = self.eval_expr(rhs)?;
                self.eval_binary(*op, lhs, rhs)
            }
            Expr::Call { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.eval_expr(arg))
                    .collect::<Result<Vec<_>>>()?;
                self.eval_call(name, args)
            }
        }
    }

    fn eval_ref(&self, name: &str) -> Result<Value> {
        if name == "input" {
            return Ok(Value::Image(self.base.clone()));
        }
        match self.bindings.get(name) {
            Some(buffer) => Ok(Value::Image(buffer.clone())),
            None => Err(IqError::Eval {
                message: format!("undefined identifier '{}'", name),
                help: Some(
                    "the base image is 'input'; layers must be bound with 'as' in an \
                     earlier statement before they are referenced"
                        .to_string(),
                ),
            }),
        }
    }

    fn eval_unary(&self, op: UnaryOp, value: Value) -> Result<Value> {
        match (op, value) {
            (UnaryOp::Neg, Value::Scalar(n)) => Ok(Value::Scalar(-n)),
            (UnaryOp::Neg, Value::Image(img)) => Ok(Value::Image(ops::invert(&img))),
            (UnaryOp::Neg, Value::Colour(c)) => Ok(Value::Colour(c.invert())),
        }
    }

    fn eval_binary(&self, op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
        use BinaryOp::*;
        use Value::*;

        match (op, lhs, rhs) {
            // Scalar arithmetic
            (Add, Scalar(a), Scalar(b)) => Ok(Scalar(a + b)),
            (Sub, Scalar(a), Scalar(b)) => Ok(Scalar(a - b)),
            (Mul, Scalar(a), Scalar(b)) => Ok(Scalar(a * b)),
            (Div, Scalar(a), Scalar(b)) => {
                if b == 0.0 {
                    Err(IqError::Eval {
                        message: "division by zero".to_string(),
                        help: None,
                    })
                } else {
                    Ok(Scalar(a / b))
                }
            }
            (Pow, Scalar(a), Scalar(b)) => Ok(Scalar(a.powf(b))),

            // Image / scalar
            (Add, Image(img), Scalar(s)) | (Add, Scalar(s), Image(img)) => {
                Ok(Image(ops::shift(&img, s)))
            }
            (Sub, Image(img), Scalar(s)) => Ok(Image(ops::shift(&img, -s))),
            (Mul, Image(img), Scalar(s)) | (Mul, Scalar(s), Image(img)) => {
                Ok(Image(ops::gain(&img, s)))
            }
            (Div, Image(img), Scalar(s)) => Ok(Image(ops::div_scalar(&img, s)?)),

            // Image / colour
            (Add, Image(img), Colour(c)) | (Add, Colour(c), Image(img)) => {
                Ok(Image(ops::add_colour(&img, c)))
            }
            (Sub, Image(img), Colour(c)) => Ok(Image(ops::sub_colour(&img, c))),

            // Image / image
            (Add, Image(a), Image(b)) => Ok(Image(ops::add_images(&a, &b)?)),
            (Sub, Image(a), Image(b)) => Ok(Image(ops::sub_images(&a, &b)?)),
            (Mul, Image(a), Image(b)) => Ok(Image(ops::mul_images(&a, &b)?)),

            (op, lhs, rhs) => Err(IqError::TypeMismatch {
                operator: op.symbol().to_string(),
                operands: format!("{} and {}", lhs.kind(), rhs.kind()),
                help: None,
            }),
        }
    }

    fn eval_call(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        match name {
            "blend" => {
                let (a, b, t) = self.three_args(name, args, "blend(a, b, t)")?;
                match (a, b, t) {
                    (Value::Image(a), Value::Image(b), Value::Scalar(t)) => {
                        Ok(Value::Image(ops::blend(&a, &b, t)?))
                    }
                    (a, b, t) => Err(self.call_mismatch(name, &[a, b, t], "(image, image, scalar)")),
                }
            }
            "mask" => {
                let (img, m) = self.two_args(name, args, "mask(img, m)")?;
                match (img, m) {
                    (Value::Image(img), Value::Image(m)) => Ok(Value::Image(ops::mask(&img, &m)?)),
                    (a, b) => Err(self.call_mismatch(name, &[a, b], "(image, image)")),
                }
            }
            "grey" => {
                let img = self.one_arg(name, args, "grey(img)")?;
                match img {
                    Value::Image(img) => Ok(Value::Image(ops::grey(&img))),
                    other => Err(self.call_mismatch(name, &[other], "(image)")),
                }
            }
            "invert" => {
                let img = self.one_arg(name, args, "invert(img)")?;
                match img {
                    Value::Image(img) => Ok(Value::Image(ops::invert(&img))),
                    other => Err(self.call_mismatch(name, &[other], "(image)")),
                }
            }
            "fill" => {
                let colour = self.one_arg(name, args, "fill(colour)")?;
                match colour {
                    Value::Colour(c) => Ok(Value::Image(PixelBuffer::filled(
                        self.base.width(),
                        self.base.height(),
                        c,
                    ))),
                    other => Err(self.call_mismatch(name, &[other], "(colour)")),
                }
            }
            "crop" => self.eval_crop(args),
            "lighten" | "darken" | "saturate" | "desaturate" => {
                let usage = format!("{}(img, amount)", name);
                let (img, amount) = self.two_args(name, args, &usage)?;
                match (img, amount) {
                    (Value::Image(img), Value::Scalar(f)) => {
                        let out = match name {
                            "lighten" => ops::lighten(&img, f),
                            "darken" => ops::darken(&img, f),
                            "saturate" => ops::saturate(&img, f),
                            _ => ops::desaturate(&img, f),
                        };
                        Ok(Value::Image(out))
                    }
                    (a, b) => Err(self.call_mismatch(name, &[a, b], "(image, scalar)")),
                }
            }
            "min" | "max" => {
                let usage = format!("{}(a, b)", name);
                let (a, b) = self.two_args(name, args, &usage)?;
                match (a, b) {
                    (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(if name == "min" {
                        a.min(b)
                    } else {
                        a.max(b)
                    })),
                    (Value::Image(a), Value::Image(b)) => Ok(Value::Image(if name == "min" {
                        ops::min_images(&a, &b)?
                    } else {
                        ops::max_images(&a, &b)?
                    })),
                    (a, b) => Err(self.call_mismatch(
                        name,
                        &[a, b],
                        "(scalar, scalar) or (image, image)",
                    )),
                }
            }
            "sqrt" => {
                let x = self.one_arg(name, args, "sqrt(x)")?;
                match x {
                    Value::Scalar(x) if x < 0.0 => Err(IqError::Eval {
                        message: format!("sqrt of negative number {}", x),
                        help: None,
                    }),
                    Value::Scalar(x) => Ok(Value::Scalar(x.sqrt())),
                    other => Err(self.call_mismatch(name, &[other], "(scalar)")),
                }
            }
            _ => Err(IqError::Eval {
                message: format!("unknown function '{}'", name),
                help: Some(
                    "available functions: blend, crop, darken, desaturate, fill, grey, \
                     invert, lighten, mask, max, min, sqrt"
                        .to_string(),
                ),
            }),
        }
    }

    fn eval_crop(&self, args: Vec<Value>) -> Result<Value> {
        if args.len() != 5 {
            return Err(self.arity(args.len(), "crop", 5, "crop(img, x, y, w, h)"));
        }
        let mut args = args.into_iter();
        let img = match args.next() {
            Some(Value::Image(img)) => img,
            Some(other) => {
                return Err(self.call_mismatch("crop", &[other], "(image, 4 scalars)"))
            }
            None => unreachable!(),
        };

        let mut bounds = [0usize; 4];
        for slot in bounds.iter_mut() {
            match args.next() {
                Some(Value::Scalar(n)) if n >= 0.0 && n.fract() == 0.0 => *slot = n as usize,
                Some(Value::Scalar(n)) => {
                    return Err(IqError::Eval {
                        message: format!("crop bound {} is not a non-negative integer", n),
                        help: None,
                    })
                }
                Some(other) => {
                    return Err(self.call_mismatch("crop", &[other], "(image, 4 scalars)"))
                }
                None => unreachable!(),
            }
        }

        let [x, y, w, h] = bounds;
        Ok(Value::Image(ops::crop(&img, x, y, w, h)?))
    }

    fn arity(&self, got: usize, name: &str, want: usize, usage: &str) -> IqError {
        IqError::Eval {
            message: format!("{}() requires {} arguments, got {}", name, want, got),
            help: Some(format!("Usage: {}", usage)),
        }
    }

    fn one_arg(&self, name: &str, args: Vec<Value>, usage: &str) -> Result<Value> {
        let mut args = args;
        if args.len() != 1 {
            return Err(self.arity(args.len(), name, 1, usage));
        }
        Ok(args.remove(0))
    }

    fn two_args(&self, name: &str, args: Vec<Value>, usage: &str) -> Result<(Value, Value)> {
        let mut args = args;
        if args.len() != 2 {
            return Err(self.arity(args.len(), name, 2, usage));
        }
        let b = args.remove(1);
        let a = args.remove(0);
        Ok((a, b))
    }

    fn three_args(&self, name: &str, args: Vec<Value>, usage: &str) -> Result<(Value, Value, Value)> {
        let mut args = args;
        if args.len() != 3 {
            return Err(self.arity(args.len(), name, 3, usage));
        }
        let c = args.remove(2);
        let b = args.remove(1);
        let a = args.remove(0);
        Ok((a, b, c))
    }

    fn call_mismatch(&self, name: &str, args: &[Value], expected: &str) -> IqError {
        let kinds: Vec<String> = args.iter().map(|a| a.kind().to_string()).collect();
        IqError::TypeMismatch {
            operator: name.to_string(),
            operands: format!("({})", kinds.join(", ")),
            help: Some(format!("{}() expects {}", name, expected)),
        }
    }
}
