//! Tree-walking evaluator.
//!
//! Statements run for effect and report how control leaves them through
//! [`Flow`]; runtime failures travel separately as `Err(RuntimeError)`.  A
//! `return` therefore unwinds through blocks and loops as an ordinary value
//! until [`Function::call`](crate::function::Function) consumes it.
//!
//! Variable access is driven by the resolver's output: a reference with a
//! recorded hop count reads exactly that scope, everything else is a global.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info, trace};

use crate::callable::Callable;
use crate::class::{Class, INITIALIZER};
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::function::Function;
use crate::native::{self, NativeFunction};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

/// How control left a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fall through to the next statement.
    Next,

    /// A `return` is unwinding to the nearest call boundary.
    Return(Value),
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// An interpreter printing to standard output, with host functions
    /// such as `clock` predefined.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// An interpreter whose `print` statements write to `out`.
    pub fn with_output(out: impl Write + 'static) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        let mut interpreter = Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out: Box::new(out),
        };

        for builtin in native::builtins() {
            interpreter.define_native(builtin);
        }

        interpreter
    }

    /// Registers a host function in the global scope.
    pub fn define_native(&mut self, native: NativeFunction) {
        debug!("Defining native function '{}'", native.name);

        self.globals
            .borrow_mut()
            .define(native.name, Value::Native(native));
    }

    pub fn globals(&self) -> &EnvRef {
        &self.globals
    }

    /// Records that the reference `id` binds `depth` scopes out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        trace!("note_local {:?} -> {}", id, depth);
        self.locals.insert(id, depth);
    }

    /// Runs a program, stopping at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> IResult<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                debug!("Top-level return ignored: {}", value);
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────────

    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Next)
            }

            Stmt::Print { keyword, value } => {
                let value: Value = self.evaluate(value)?;
                writeln!(self.out, "{}", value).map_err(|e| {
                    RuntimeError::new(keyword, format!("Unable to write output: {}", e))
                })?;
                debug!("Printed value: {}", value);
                Ok(Flow::Next)
            }

            Stmt::Var { name, initializer } => {
                let value: Value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Next)
            }

            Stmt::Block(statements) => {
                let environment: EnvRef = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(Flow::Next)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Next)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(function));
                Ok(Flow::Next)
            }

            Stmt::Return { value, .. } => {
                let value: Value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                trace!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let superclass: Option<Class> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let token: &Token = match expr {
                                Expr::Variable {
                                    name: super_name, ..
                                } => super_name,
                                _ => name,
                            };
                            return Err(RuntimeError::new(token, "Superclass must be a class."));
                        }
                    },
                    None => None,
                };

                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                // Methods of a subclass close over an extra scope holding `super`.
                let method_env: EnvRef = match &superclass {
                    Some(parent) => {
                        let env: EnvRef = Environment::child_of(&self.environment);
                        env.borrow_mut()
                            .define("super", Value::Class(parent.clone()));
                        env
                    }
                    None => Rc::clone(&self.environment),
                };

                let table: HashMap<String, Function> = methods
                    .iter()
                    .map(|method| {
                        let is_initializer: bool = method.name.lexeme == INITIALIZER;
                        let function = Function::new(
                            Rc::clone(method),
                            Rc::clone(&method_env),
                            is_initializer,
                        );
                        (method.name.lexeme.clone(), function)
                    })
                    .collect();

                let class = Class::new(&name.lexeme, superclass, table);
                debug!("Defined class '{}'", class.name);

                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(class))?;
                Ok(Flow::Next)
            }
        }
    }

    /// Runs `statements` inside `environment`, restoring the previous scope
    /// on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> IResult<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, environment);

        let result: IResult<Flow> = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Next)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left: Value = self.evaluate(left)?;

                let short_circuit: bool = if operator.token_type == TokenType::OR {
                    left.is_truthy()
                } else {
                    !left.is_truthy()
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(name, *id),

            Expr::Assign { id, name, value } => {
                let value: Value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, name, value.clone())?
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee: Value = self.evaluate(callee)?;

                let mut values: Vec<Value> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.evaluate(argument)?);
                }

                self.call_value(&callee, paren, values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => instance.get(name),
                _ => Err(RuntimeError::new(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::new(name, "Only instances have fields."));
                };

                let value: Value = self.evaluate(value)?;
                instance.set(name, value.clone());
                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(keyword, *id),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> IResult<Value> {
        let right: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(operator, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),
            _ => Err(RuntimeError::new(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> IResult<Value> {
        let left: Value = self.evaluate(left)?;
        let right: Value = self.evaluate(right)?;

        trace!("Binary {} on {} and {}", operator.lexeme, left, right);

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(RuntimeError::new(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),
            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => {
                let (a, b) = number_operands(operator, &left, &right)?;

                match operator.token_type {
                    TokenType::MINUS => Ok(Value::Number(a - b)),
                    TokenType::STAR => Ok(Value::Number(a * b)),
                    TokenType::SLASH => Ok(Value::Number(a / b)),
                    TokenType::GREATER => Ok(Value::Bool(a > b)),
                    TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
                    TokenType::LESS => Ok(Value::Bool(a < b)),
                    TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
                    _ => Err(RuntimeError::new(operator, "Invalid binary operator.")),
                }
            }
        }
    }

    /// `super.method` starts lookup at the superclass captured where the
    /// enclosing method was defined and binds the result to the current `this`.
    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let Some(&distance) = self.locals.get(&id) else {
            return Err(RuntimeError::new(
                keyword,
                "Can't use 'super' outside of a class.",
            ));
        };

        let superclass: Class = match Environment::get_at(&self.environment, distance, keyword)? {
            Value::Class(class) => class,
            _ => return Err(RuntimeError::new(keyword, "Superclass must be a class.")),
        };

        // `this` always lives one scope inside the `super` scope.
        let this_token = Token::synthetic("this", keyword.line);
        let this_distance: usize = distance.saturating_sub(1);
        let instance = match Environment::get_at(&self.environment, this_distance, &this_token)? {
            Value::Instance(instance) => instance,
            _ => return Err(RuntimeError::new(keyword, "Invalid 'this' binding.")),
        };

        match superclass.find_method(&method.lexeme) {
            Some(found) => Ok(Value::Function(found.bind(instance))),
            None => Err(RuntimeError::new(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn look_up_variable(&self, name: &Token, id: ExprId) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn call_value(
        &mut self,
        callee: &Value,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> IResult<Value> {
        let callable: &dyn Callable = match callee {
            Value::Function(function) => function,
            Value::Native(native) => native,
            Value::Class(class) => class,
            _ => {
                return Err(RuntimeError::new(
                    paren,
                    "Can only call functions and classes.",
                ))
            }
        };

        if arguments.len() != callable.arity() {
            return Err(RuntimeError::new(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        callable.call(self, arguments, paren)
    }
}

fn number_operands(operator: &Token, left: &Value, right: &Value) -> IResult<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}
