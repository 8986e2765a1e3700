//! Sandbox Interpreter for the Example Playground
//!
//! Tree-walking evaluator over the oxc AST of the compiled program. The only
//! ambient bindings are the language intrinsics, the JSX pragma and whatever
//! the Symbol Registry materializes. Every statement and expression costs one
//! step; calls and component mounts count against the depth limit.

use oxc_ast::ast::{
    Argument, ArrayExpression, ArrayExpressionElement, ArrowFunctionExpression,
    AssignmentExpression, AssignmentTarget, BinaryExpression, BindingPattern, CallExpression,
    ChainElement, ChainExpression, Class, ClassElement, ComputedMemberExpression, Decorator,
    Expression, ForInStatement, ForOfStatement, ForStatement, ForStatementInit, ForStatementLeft,
    FormalParameters, Function, LogicalExpression, MethodDefinitionKind, NewExpression,
    ObjectExpression, ObjectPropertyKind, PrivateFieldExpression, Program, PropertyKey,
    PropertyKind, SimpleAssignmentTarget, Statement, StaticMemberExpression, SwitchStatement,
    TemplateLiteral, TryStatement, UnaryExpression, UpdateExpression, VariableDeclaration,
    VariableDeclarationKind,
};
use oxc_syntax::operator::{
    AssignmentOperator, BinaryOperator, LogicalOperator, UnaryOperator, UpdateOperator,
};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::{Rc, Weak};
use thiserror::Error;

use crate::config::PlaygroundConfig;
use crate::intrinsics;
use crate::value::{
    array_index, utf16_len, AssignError, Callable, ClassRecord, Environment, Frame, JsObject,
    ObjRef, ObjectKind, Scope, Value,
};

const RANDOM_SEED: u64 = 0x9E37_79B9_7F4A_7C15;
const MAX_DENSE_INDEX: usize = 1 << 20;

// ═══════════════════════════════════════════════════════════════════════════════
// FAULTS & LIMITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Non-catchable conditions that abort a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Execution aborted after exceeding {0} evaluation steps")]
    StepBudget(u64),

    #[error("Maximum call stack size exceeded")]
    CallDepth,

    #[error("Unsupported in the example sandbox: {0}")]
    Unsupported(&'static str),
}

pub enum Fault<'a> {
    /// A JavaScript exception; `try`/`catch` can observe it.
    Throw(Value<'a>),
    Halt(EvalError),
}

pub type Completion<'a> = Result<Value<'a>, Fault<'a>>;

impl Fault<'_> {
    /// What an error overlay shows for this fault.
    pub fn message(&self) -> String {
        match self {
            Fault::Halt(err) => err.to_string(),
            Fault::Throw(Value::Object(obj)) => match property_of(obj, "message") {
                Value::Undefined => Value::Object(Rc::clone(obj)).to_js_string(),
                message => message.to_js_string(),
            },
            Fault::Throw(value) => value.to_js_string(),
        }
    }
}

impl fmt::Debug for Fault<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fault::Throw(_) => write!(f, "Throw({})", self.message()),
            Fault::Halt(err) => write!(f, "Halt({:?})", err),
        }
    }
}

pub fn type_error<'a>(message: impl Into<String>) -> Fault<'a> {
    Fault::Throw(intrinsics::make_error("TypeError", &message.into()))
}

pub fn reference_error<'a>(name: &str) -> Fault<'a> {
    Fault::Throw(intrinsics::make_error(
        "ReferenceError",
        &format!("{} is not defined", name),
    ))
}

fn unsupported<'a>(what: &'static str) -> Fault<'a> {
    Fault::Halt(EvalError::Unsupported(what))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_steps: u64,
    pub max_call_depth: usize,
    pub max_mount_depth: usize,
    pub max_string_length: usize,
    pub max_array_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits::from_config(&PlaygroundConfig::default())
    }
}

impl Limits {
    pub fn from_config(config: &PlaygroundConfig) -> Self {
        Limits {
            max_steps: config.max_steps,
            max_call_depth: config.max_call_depth,
            max_mount_depth: config.max_mount_depth,
            max_string_length: config.max_string_length,
            max_array_length: config.max_array_length,
        }
    }
}

enum Flow<'a> {
    Normal,
    Return(Value<'a>),
    Break(Option<String>),
    Continue(Option<String>),
}

enum Reference<'a> {
    Binding(String),
    Property(Value<'a>, Rc<str>),
}

// ═══════════════════════════════════════════════════════════════════════════════
// INTERPRETER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct Interpreter<'a> {
    limits: Limits,
    steps: u64,
    depth: usize,
    mount_depth: usize,
    seed: u64,
    global: Scope<'a>,
    /// Scopes captured by closures and classes; cleared on drop to break cycles.
    captured: Vec<Weak<Environment<'a>>>,
    /// Prototypes whose `constructor` points back at their class; unlinked on drop.
    linked: Vec<ObjRef<'a>>,
}

impl<'a> Interpreter<'a> {
    pub fn new(limits: Limits) -> Self {
        let global = Environment::root();
        let linked = intrinsics::install(&global);
        Interpreter {
            limits,
            steps: 0,
            depth: 0,
            mount_depth: 0,
            seed: RANDOM_SEED,
            global,
            captured: Vec::new(),
            linked,
        }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn global(&self) -> &Scope<'a> {
        &self.global
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Deterministic pseudo-random number in `[0, 1)`; same sequence every run.
    pub fn random(&mut self) -> f64 {
        let mut x = self.seed;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.seed = x;
        (x.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn tick(&mut self) -> Result<(), Fault<'a>> {
        self.steps += 1;
        if self.steps > self.limits.max_steps {
            return Err(Fault::Halt(EvalError::StepBudget(self.limits.max_steps)));
        }
        Ok(())
    }

    pub fn enter(&mut self) -> Result<(), Fault<'a>> {
        if self.depth >= self.limits.max_call_depth {
            return Err(Fault::Halt(EvalError::CallDepth));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Nesting guard for mounting; child arrays and props can contain themselves.
    pub fn enter_mount(&mut self) -> Result<(), Fault<'a>> {
        if self.mount_depth >= self.limits.max_mount_depth {
            return Err(Fault::Halt(EvalError::CallDepth));
        }
        self.mount_depth += 1;
        Ok(())
    }

    pub fn leave_mount(&mut self) {
        self.mount_depth = self.mount_depth.saturating_sub(1);
    }

    /// `RangeError` when a string of `units` UTF-16 code units would exceed the cap.
    pub fn check_string_length(&self, units: usize) -> Result<(), Fault<'a>> {
        if units > self.limits.max_string_length {
            return Err(Fault::Throw(intrinsics::make_error("RangeError", "Invalid string length")));
        }
        Ok(())
    }

    pub fn check_array_length(&self, len: usize) -> Result<(), Fault<'a>> {
        if len > self.limits.max_array_length {
            return Err(Fault::Throw(intrinsics::make_error("RangeError", "Invalid array length")));
        }
        Ok(())
    }

    /// Checked form of `Value::string` for natives that build text.
    pub fn new_string(&self, text: &str) -> Completion<'a> {
        self.check_string_length(utf16_len(text))?;
        Ok(Value::string(text))
    }

    pub fn new_array(&self, items: Vec<Value<'a>>) -> Completion<'a> {
        self.check_array_length(items.len())?;
        Ok(Value::array(items))
    }

    fn capture(&mut self, scope: &Scope<'a>) {
        let weak = Rc::downgrade(scope);
        if !self.captured.last().map_or(false, |w| w.ptr_eq(&weak)) {
            self.captured.push(weak);
        }
    }

    /// Run a whole program; the result is the value of its last expression statement.
    pub fn run_program(&mut self, program: &'a Program<'a>) -> Completion<'a> {
        let scope = Rc::clone(&self.global);
        let frame = Frame::detached();
        self.hoist(&program.body, &scope);

        let mut completion = Value::Undefined;
        for stmt in program.body.iter() {
            if let Statement::ExpressionStatement(s) = stmt {
                self.tick()?;
                completion = self.eval(&s.expression, &scope, &frame)?;
                continue;
            }
            match self.exec(stmt, &scope, &frame)? {
                Flow::Normal => {}
                Flow::Return(value) => return Ok(value),
                Flow::Break(_) | Flow::Continue(_) => break,
            }
        }
        Ok(completion)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATEMENTS
    // ═══════════════════════════════════════════════════════════════════════════

    fn hoist(&mut self, stmts: &'a [Statement<'a>], scope: &Scope<'a>) {
        for stmt in stmts {
            if let Statement::FunctionDeclaration(func) = stmt {
                if let Some(id) = &func.id {
                    let value = self.make_function(func, scope, None);
                    scope.declare(id.name.as_str(), value, true);
                }
            }
        }
    }

    fn exec_block(
        &mut self,
        stmts: &'a [Statement<'a>],
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        self.hoist(stmts, scope);
        for stmt in stmts {
            match self.exec(stmt, scope, frame)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(
        &mut self,
        stmt: &'a Statement<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        self.tick()?;
        match stmt {
            Statement::ExpressionStatement(s) => {
                self.eval(&s.expression, scope, frame)?;
                Ok(Flow::Normal)
            }
            Statement::VariableDeclaration(decl) => {
                self.declare_variables(decl, scope, frame)?;
                Ok(Flow::Normal)
            }
            Statement::FunctionDeclaration(_) | Statement::EmptyStatement(_) => Ok(Flow::Normal),
            Statement::DebuggerStatement(_) => Ok(Flow::Normal),
            Statement::ClassDeclaration(class) => {
                let value = self.eval_class(class, scope, frame)?;
                if let Some(id) = &class.id {
                    scope.declare(id.name.as_str(), value, true);
                }
                Ok(Flow::Normal)
            }
            Statement::ReturnStatement(s) => {
                let value = match &s.argument {
                    Some(arg) => self.eval(arg, scope, frame)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Statement::IfStatement(s) => {
                if self.eval(&s.test, scope, frame)?.truthy() {
                    self.exec(&s.consequent, scope, frame)
                } else if let Some(alternate) = &s.alternate {
                    self.exec(alternate, scope, frame)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::BlockStatement(block) => {
                let inner = Environment::child(scope);
                self.exec_block(&block.body, &inner, frame)
            }
            Statement::ThrowStatement(s) => Err(Fault::Throw(self.eval(&s.argument, scope, frame)?)),
            Statement::TryStatement(s) => self.exec_try(s, scope, frame),
            Statement::ForStatement(s) => self.exec_for(s, scope, frame),
            Statement::ForOfStatement(s) => self.exec_for_of(s, scope, frame),
            Statement::ForInStatement(s) => self.exec_for_in(s, scope, frame),
            Statement::WhileStatement(s) => {
                while self.eval(&s.test, scope, frame)?.truthy() {
                    match self.exec(&s.body, scope, frame)? {
                        Flow::Break(None) => break,
                        Flow::Continue(None) | Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::DoWhileStatement(s) => {
                loop {
                    match self.exec(&s.body, scope, frame)? {
                        Flow::Break(None) => break,
                        Flow::Continue(None) | Flow::Normal => {}
                        flow => return Ok(flow),
                    }
                    if !self.eval(&s.test, scope, frame)?.truthy() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::SwitchStatement(s) => self.exec_switch(s, scope, frame),
            Statement::BreakStatement(s) => {
                Ok(Flow::Break(s.label.as_ref().map(|l| l.name.to_string())))
            }
            Statement::ContinueStatement(s) => {
                Ok(Flow::Continue(s.label.as_ref().map(|l| l.name.to_string())))
            }
            Statement::LabeledStatement(s) => match self.exec(&s.body, scope, frame)? {
                Flow::Break(Some(label)) if label == s.label.name.as_str() => Ok(Flow::Normal),
                flow => Ok(flow),
            },
            _ => Err(unsupported("this statement form")),
        }
    }

    fn declare_variables(
        &mut self,
        decl: &'a VariableDeclaration<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<(), Fault<'a>> {
        let mutable = !matches!(decl.kind, VariableDeclarationKind::Const);
        for declarator in decl.declarations.iter() {
            let value = match &declarator.init {
                Some(init) => self.eval(init, scope, frame)?,
                None => Value::Undefined,
            };
            if let BindingPattern::BindingIdentifier(id) = &declarator.id {
                name_anonymous(&value, id.name.as_str());
            }
            self.bind_pattern(&declarator.id, value, scope, frame, mutable)?;
        }
        Ok(())
    }

    /// Errors raised by natives are plain records; give them the prototype
    /// of their class once they reach script code.
    fn adopt_error_prototype(&self, thrown: &Value<'a>) {
        let Value::Object(obj) = thrown else { return };
        let name = {
            let record = obj.borrow();
            if record.proto.is_some() || !matches!(record.kind, ObjectKind::Ordinary) {
                return;
            }
            match record.own("name") {
                Some(Value::String(name)) => name,
                _ => return,
            }
        };
        let prototype = self.linked.iter().find(|proto| {
            matches!(proto.borrow().own("name"), Some(Value::String(ref n)) if *n == name)
        });
        if let Some(prototype) = prototype {
            obj.borrow_mut().proto = Some(Rc::clone(prototype));
        }
    }

    fn exec_try(
        &mut self,
        s: &'a TryStatement<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        let block_scope = Environment::child(scope);
        let result = match (self.exec_block(&s.block.body, &block_scope, frame), &s.handler) {
            (Err(Fault::Throw(thrown)), Some(handler)) => {
                self.adopt_error_prototype(&thrown);
                let catch_scope = Environment::child(scope);
                match &handler.param {
                    Some(param) => self
                        .bind_pattern(&param.pattern, thrown, &catch_scope, frame, true)
                        .and_then(|_| self.exec_block(&handler.body.body, &catch_scope, frame)),
                    None => self.exec_block(&handler.body.body, &catch_scope, frame),
                }
            }
            (result, _) => result,
        };

        if let Some(finalizer) = &s.finalizer {
            let finally_scope = Environment::child(scope);
            match self.exec_block(&finalizer.body, &finally_scope, frame)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        result
    }

    fn exec_for(
        &mut self,
        s: &'a ForStatement<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        let loop_scope = Environment::child(scope);
        match &s.init {
            Some(ForStatementInit::VariableDeclaration(decl)) => {
                self.declare_variables(decl, &loop_scope, frame)?
            }
            Some(init) => {
                if let Some(expr) = init.as_expression() {
                    self.eval(expr, &loop_scope, frame)?;
                }
            }
            None => {}
        }

        loop {
            self.tick()?;
            if let Some(test) = &s.test {
                if !self.eval(test, &loop_scope, frame)?.truthy() {
                    break;
                }
            }
            match self.exec(&s.body, &loop_scope, frame)? {
                Flow::Break(None) => break,
                Flow::Continue(None) | Flow::Normal => {}
                flow => return Ok(flow),
            }
            if let Some(update) = &s.update {
                self.eval(update, &loop_scope, frame)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for_of(
        &mut self,
        s: &'a ForOfStatement<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        let iterable = self.eval(&s.right, scope, frame)?;
        for item in self.iterate(&iterable)? {
            let iteration = Environment::child(scope);
            self.bind_loop_target(&s.left, item, &iteration, frame)?;
            match self.exec(&s.body, &iteration, frame)? {
                Flow::Break(None) => break,
                Flow::Continue(None) | Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_for_in(
        &mut self,
        s: &'a ForInStatement<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        let object = self.eval(&s.right, scope, frame)?;
        for (key, _) in own_entries(&object) {
            let iteration = Environment::child(scope);
            self.bind_loop_target(&s.left, Value::String(key), &iteration, frame)?;
            match self.exec(&s.body, &iteration, frame)? {
                Flow::Break(None) => break,
                Flow::Continue(None) | Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn bind_loop_target(
        &mut self,
        left: &'a ForStatementLeft<'a>,
        value: Value<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<(), Fault<'a>> {
        match left {
            ForStatementLeft::VariableDeclaration(decl) => {
                let mutable = !matches!(decl.kind, VariableDeclarationKind::Const);
                match decl.declarations.first() {
                    Some(declarator) => {
                        self.bind_pattern(&declarator.id, value, scope, frame, mutable)
                    }
                    None => Ok(()),
                }
            }
            ForStatementLeft::AssignmentTargetIdentifier(id) => {
                self.assign_binding(id.name.as_str(), value, scope)
            }
            _ => Err(unsupported("destructuring loop targets")),
        }
    }

    fn exec_switch(
        &mut self,
        s: &'a SwitchStatement<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Flow<'a>, Fault<'a>> {
        let discriminant = self.eval(&s.discriminant, scope, frame)?;
        let inner = Environment::child(scope);

        let mut start = None;
        for (index, case) in s.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                if self.eval(test, &inner, frame)?.strict_equals(&discriminant) {
                    start = Some(index);
                    break;
                }
            }
        }
        let Some(start) = start.or_else(|| s.cases.iter().position(|c| c.test.is_none())) else {
            return Ok(Flow::Normal);
        };

        for case in s.cases.iter().skip(start) {
            match self.exec_block(&case.consequent, &inner, frame)? {
                Flow::Normal => {}
                Flow::Break(None) => return Ok(Flow::Normal),
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // BINDINGS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn bind_pattern(
        &mut self,
        pattern: &'a BindingPattern<'a>,
        value: Value<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
        mutable: bool,
    ) -> Result<(), Fault<'a>> {
        match pattern {
            BindingPattern::BindingIdentifier(id) => {
                scope.declare(id.name.as_str(), value, mutable);
                Ok(())
            }
            BindingPattern::AssignmentPattern(p) => {
                let value = match value {
                    Value::Undefined => self.eval(&p.right, scope, frame)?,
                    value => value,
                };
                self.bind_pattern(&p.left, value, scope, frame, mutable)
            }
            BindingPattern::ObjectPattern(p) => {
                if value.is_nullish() {
                    return Err(type_error(format!(
                        "Cannot destructure '{}' as it is {}.",
                        value.to_js_string(),
                        value.to_js_string()
                    )));
                }
                let mut used = Vec::with_capacity(p.properties.len());
                for prop in p.properties.iter() {
                    let key = self.property_key(&prop.key, scope, frame)?;
                    let item = self.get(&value, &key)?;
                    self.bind_pattern(&prop.value, item, scope, frame, mutable)?;
                    used.push(key);
                }
                if let Some(rest) = &p.rest {
                    let mut remaining = JsObject::new(ObjectKind::Ordinary);
                    remaining.props = own_entries(&value)
                        .into_iter()
                        .filter(|(k, _)| !used.contains(k))
                        .collect();
                    let remaining = Value::Object(Rc::new(RefCell::new(remaining)));
                    self.bind_pattern(&rest.argument, remaining, scope, frame, mutable)?;
                }
                Ok(())
            }
            BindingPattern::ArrayPattern(p) => {
                let items = self.iterate(&value)?;
                for (index, element) in p.elements.iter().enumerate() {
                    if let Some(element) = element {
                        let item = items.get(index).cloned().unwrap_or(Value::Undefined);
                        self.bind_pattern(element, item, scope, frame, mutable)?;
                    }
                }
                if let Some(rest) = &p.rest {
                    let tail = items.iter().skip(p.elements.len()).cloned().collect();
                    self.bind_pattern(&rest.argument, Value::array(tail), scope, frame, mutable)?;
                }
                Ok(())
            }
        }
    }

    fn bind_params(
        &mut self,
        params: &'a FormalParameters<'a>,
        args: Vec<Value<'a>>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<(), Fault<'a>> {
        let mut args = args.into_iter();
        for param in params.items.iter() {
            let value = args.next().unwrap_or(Value::Undefined);
            self.bind_pattern(&param.pattern, value, scope, frame, true)?;
        }
        Ok(())
    }

    fn assign_binding(
        &mut self,
        name: &str,
        value: Value<'a>,
        scope: &Scope<'a>,
    ) -> Result<(), Fault<'a>> {
        match scope.assign(name, value) {
            Ok(()) => Ok(()),
            Err(AssignError::Constant) => Err(type_error("Assignment to constant variable.")),
            Err(AssignError::NotDefined) => Err(reference_error(name)),
        }
    }

    pub fn property_key(
        &mut self,
        key: &'a PropertyKey<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Rc<str>, Fault<'a>> {
        match key {
            PropertyKey::StaticIdentifier(id) => Ok(Rc::from(id.name.as_str())),
            PropertyKey::PrivateIdentifier(id) => Ok(Rc::from(format!("#{}", id.name))),
            _ => match key.as_expression() {
                Some(expr) => Ok(self.eval(expr, scope, frame)?.to_property_key()),
                None => Err(unsupported("property key")),
            },
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EXPRESSIONS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn eval(
        &mut self,
        expr: &'a Expression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        self.tick()?;
        match expr {
            Expression::BooleanLiteral(lit) => Ok(Value::Bool(lit.value)),
            Expression::NullLiteral(_) => Ok(Value::Null),
            Expression::NumericLiteral(lit) => Ok(Value::Number(lit.value)),
            Expression::StringLiteral(lit) => Ok(Value::string(lit.value.as_str())),
            Expression::TemplateLiteral(tpl) => self.eval_template(tpl, scope, frame),
            Expression::Identifier(id) => lookup(id.name.as_str(), scope),
            Expression::ThisExpression(_) => Ok(frame.this.clone()),
            Expression::ParenthesizedExpression(p) => self.eval(&p.expression, scope, frame),
            Expression::SequenceExpression(seq) => {
                let mut last = Value::Undefined;
                for e in seq.expressions.iter() {
                    last = self.eval(e, scope, frame)?;
                }
                Ok(last)
            }
            Expression::ConditionalExpression(c) => {
                if self.eval(&c.test, scope, frame)?.truthy() {
                    self.eval(&c.consequent, scope, frame)
                } else {
                    self.eval(&c.alternate, scope, frame)
                }
            }
            Expression::ArrayExpression(arr) => self.eval_array(arr, scope, frame),
            Expression::ObjectExpression(obj) => self.eval_object(obj, scope, frame),
            Expression::FunctionExpression(func) => Ok(self.make_function(func, scope, None)),
            Expression::ArrowFunctionExpression(arrow) => Ok(self.make_arrow(arrow, scope, frame)),
            Expression::ClassExpression(class) => self.eval_class(class, scope, frame),
            Expression::LogicalExpression(l) => self.eval_logical(l, scope, frame),
            Expression::BinaryExpression(b) => self.eval_binary(b, scope, frame),
            Expression::UnaryExpression(u) => self.eval_unary(u, scope, frame),
            Expression::UpdateExpression(u) => self.eval_update(u, scope, frame),
            Expression::AssignmentExpression(a) => self.eval_assignment(a, scope, frame),
            Expression::StaticMemberExpression(_)
            | Expression::ComputedMemberExpression(_)
            | Expression::PrivateFieldExpression(_)
            | Expression::CallExpression(_) => Ok(self
                .eval_link(expr, scope, frame)?
                .map(|(_, value)| value)
                .unwrap_or(Value::Undefined)),
            Expression::NewExpression(n) => self.eval_new(n, scope, frame),
            Expression::ChainExpression(chain) => self.eval_chain(chain, scope, frame),
            Expression::RegExpLiteral(_) => Err(unsupported("regular expression literals")),
            Expression::TaggedTemplateExpression(_) => Err(unsupported("tagged templates")),
            Expression::AwaitExpression(_) | Expression::YieldExpression(_) => {
                Err(unsupported("async functions and generators"))
            }
            _ => Err(unsupported("this expression form")),
        }
    }

    fn eval_template(
        &mut self,
        tpl: &'a TemplateLiteral<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let mut out = String::new();
        for (index, quasi) in tpl.quasis.iter().enumerate() {
            match &quasi.value.cooked {
                Some(cooked) => out.push_str(cooked.as_str()),
                None => out.push_str(quasi.value.raw.as_str()),
            }
            if let Some(expr) = tpl.expressions.get(index) {
                out.push_str(&self.eval(expr, scope, frame)?.to_js_string());
            }
        }
        self.new_string(&out)
    }

    fn eval_array(
        &mut self,
        arr: &'a ArrayExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let mut items = Vec::with_capacity(arr.elements.len());
        for element in arr.elements.iter() {
            match element {
                ArrayExpressionElement::SpreadElement(spread) => {
                    let value = self.eval(&spread.argument, scope, frame)?;
                    items.extend(self.iterate(&value)?);
                    self.check_array_length(items.len())?;
                }
                ArrayExpressionElement::Elision(_) => items.push(Value::Undefined),
                _ => {
                    if let Some(expr) = element.as_expression() {
                        items.push(self.eval(expr, scope, frame)?);
                    }
                }
            }
        }
        Ok(Value::array(items))
    }

    fn eval_object(
        &mut self,
        obj: &'a ObjectExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let object = Value::object(ObjectKind::Ordinary);
        for prop in obj.properties.iter() {
            match prop {
                ObjectPropertyKind::ObjectProperty(p) => {
                    if !matches!(p.kind, PropertyKind::Init) {
                        return Err(unsupported("getters and setters"));
                    }
                    let key = self.property_key(&p.key, scope, frame)?;
                    let value = self.eval(&p.value, scope, frame)?;
                    name_anonymous(&value, &key);
                    self.set(&object, &key, value)?;
                }
                ObjectPropertyKind::SpreadProperty(spread) => {
                    let source = self.eval(&spread.argument, scope, frame)?;
                    for (key, value) in own_entries(&source) {
                        self.set(&object, &key, value)?;
                    }
                }
            }
        }
        Ok(object)
    }

    fn eval_logical(
        &mut self,
        l: &'a LogicalExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let left = self.eval(&l.left, scope, frame)?;
        let short_circuit = match l.operator {
            LogicalOperator::And => !left.truthy(),
            LogicalOperator::Or => left.truthy(),
            LogicalOperator::Coalesce => !left.is_nullish(),
        };
        if short_circuit {
            Ok(left)
        } else {
            self.eval(&l.right, scope, frame)
        }
    }

    fn eval_binary(
        &mut self,
        b: &'a BinaryExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let left = self.eval(&b.left, scope, frame)?;
        let right = self.eval(&b.right, scope, frame)?;
        self.binary_op(b.operator, left, right)
    }

    pub fn binary_op(
        &mut self,
        op: BinaryOperator,
        left: Value<'a>,
        right: Value<'a>,
    ) -> Completion<'a> {
        let value = match op {
            BinaryOperator::Addition => self.add(&left, &right)?,
            BinaryOperator::Subtraction => Value::Number(left.to_number() - right.to_number()),
            BinaryOperator::Multiplication => Value::Number(left.to_number() * right.to_number()),
            BinaryOperator::Division => Value::Number(left.to_number() / right.to_number()),
            BinaryOperator::Remainder => Value::Number(left.to_number() % right.to_number()),
            BinaryOperator::Exponential => Value::Number(left.to_number().powf(right.to_number())),
            BinaryOperator::Equality => Value::Bool(left.loose_equals(&right)),
            BinaryOperator::Inequality => Value::Bool(!left.loose_equals(&right)),
            BinaryOperator::StrictEquality => Value::Bool(left.strict_equals(&right)),
            BinaryOperator::StrictInequality => Value::Bool(!left.strict_equals(&right)),
            BinaryOperator::LessThan => Value::Bool(compare(&left, &right) == Some(Ordering::Less)),
            BinaryOperator::LessEqualThan => Value::Bool(matches!(
                compare(&left, &right),
                Some(Ordering::Less | Ordering::Equal)
            )),
            BinaryOperator::GreaterThan => {
                Value::Bool(compare(&left, &right) == Some(Ordering::Greater))
            }
            BinaryOperator::GreaterEqualThan => Value::Bool(matches!(
                compare(&left, &right),
                Some(Ordering::Greater | Ordering::Equal)
            )),
            BinaryOperator::ShiftLeft => Value::Number(
                to_int32(&left).wrapping_shl(to_uint32(&right) & 31) as f64,
            ),
            BinaryOperator::ShiftRight => Value::Number(
                to_int32(&left).wrapping_shr(to_uint32(&right) & 31) as f64,
            ),
            BinaryOperator::ShiftRightZeroFill => Value::Number(
                to_uint32(&left).wrapping_shr(to_uint32(&right) & 31) as f64,
            ),
            BinaryOperator::BitwiseOR => Value::Number((to_int32(&left) | to_int32(&right)) as f64),
            BinaryOperator::BitwiseXOR => Value::Number((to_int32(&left) ^ to_int32(&right)) as f64),
            BinaryOperator::BitwiseAnd => Value::Number((to_int32(&left) & to_int32(&right)) as f64),
            BinaryOperator::In => match &right {
                Value::Object(obj) => Value::Bool(has_property(obj, &left.to_property_key())),
                _ => {
                    return Err(type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        left.to_js_string(),
                        right.to_js_string()
                    )))
                }
            },
            BinaryOperator::Instanceof => Value::Bool(self.instance_of(&left, &right)?),
        };
        Ok(value)
    }

    fn instance_of(&mut self, value: &Value<'a>, ctor: &Value<'a>) -> Result<bool, Fault<'a>> {
        if !ctor.is_callable() {
            return Err(type_error("Right-hand side of 'instanceof' is not callable"));
        }
        let Value::Object(target) = self.get(ctor, "prototype")? else {
            return Ok(false);
        };
        let Value::Object(obj) = value else {
            return Ok(false);
        };
        let mut proto = obj.borrow().proto.clone();
        while let Some(p) = proto {
            if Rc::ptr_eq(&p, &target) {
                return Ok(true);
            }
            let next = p.borrow().proto.clone();
            proto = next;
        }
        Ok(false)
    }

    fn eval_unary(
        &mut self,
        u: &'a UnaryExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        match u.operator {
            UnaryOperator::Typeof => {
                if let Expression::Identifier(id) = &u.argument {
                    if !scope.has(id.name.as_str()) {
                        return Ok(Value::string("undefined"));
                    }
                }
                Ok(Value::string(self.eval(&u.argument, scope, frame)?.type_of()))
            }
            UnaryOperator::Delete => self.eval_delete(&u.argument, scope, frame),
            UnaryOperator::Void => {
                self.eval(&u.argument, scope, frame)?;
                Ok(Value::Undefined)
            }
            UnaryOperator::LogicalNot => Ok(Value::Bool(!self.eval(&u.argument, scope, frame)?.truthy())),
            UnaryOperator::UnaryNegation => {
                Ok(Value::Number(-self.eval(&u.argument, scope, frame)?.to_number()))
            }
            UnaryOperator::UnaryPlus => {
                Ok(Value::Number(self.eval(&u.argument, scope, frame)?.to_number()))
            }
            UnaryOperator::BitwiseNot => {
                let value = self.eval(&u.argument, scope, frame)?;
                Ok(Value::Number(!to_int32(&value) as f64))
            }
        }
    }

    fn eval_delete(
        &mut self,
        argument: &'a Expression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let (object, key) = match argument {
            Expression::StaticMemberExpression(m) => (
                self.eval(&m.object, scope, frame)?,
                Rc::from(m.property.name.as_str()),
            ),
            Expression::ComputedMemberExpression(m) => {
                let object = self.eval(&m.object, scope, frame)?;
                let key = self.eval(&m.expression, scope, frame)?.to_property_key();
                (object, key)
            }
            other => {
                self.eval(other, scope, frame)?;
                return Ok(Value::Bool(true));
            }
        };
        if let Value::Object(obj) = &object {
            obj.borrow_mut().remove_own(&key);
        }
        Ok(Value::Bool(true))
    }

    fn eval_update(
        &mut self,
        u: &'a UpdateExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let reference = self.simple_target(&u.argument, scope, frame)?;
        let old = self.read_ref(&reference, scope)?.to_number();
        let new = match u.operator {
            UpdateOperator::Increment => old + 1.0,
            UpdateOperator::Decrement => old - 1.0,
        };
        self.write_ref(&reference, Value::Number(new), scope)?;
        Ok(Value::Number(if u.prefix { new } else { old }))
    }

    fn eval_assignment(
        &mut self,
        a: &'a AssignmentExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let reference = self.assignment_target(&a.left, scope, frame)?;
        let value = match a.operator {
            AssignmentOperator::Assign => self.eval(&a.right, scope, frame)?,
            AssignmentOperator::LogicalAnd
            | AssignmentOperator::LogicalOr
            | AssignmentOperator::LogicalNullish => {
                let current = self.read_ref(&reference, scope)?;
                let keep = match a.operator {
                    AssignmentOperator::LogicalAnd => !current.truthy(),
                    AssignmentOperator::LogicalOr => current.truthy(),
                    _ => !current.is_nullish(),
                };
                if keep {
                    return Ok(current);
                }
                self.eval(&a.right, scope, frame)?
            }
            op => {
                let current = self.read_ref(&reference, scope)?;
                let right = self.eval(&a.right, scope, frame)?;
                let binary = compound_operator(op).ok_or_else(|| unsupported("assignment operator"))?;
                self.binary_op(binary, current, right)?
            }
        };
        self.write_ref(&reference, value.clone(), scope)?;
        Ok(value)
    }

    fn simple_target(
        &mut self,
        target: &'a SimpleAssignmentTarget<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Reference<'a>, Fault<'a>> {
        match target {
            SimpleAssignmentTarget::AssignmentTargetIdentifier(id) => {
                Ok(Reference::Binding(id.name.to_string()))
            }
            SimpleAssignmentTarget::StaticMemberExpression(m) => Ok(Reference::Property(
                self.eval(&m.object, scope, frame)?,
                Rc::from(m.property.name.as_str()),
            )),
            SimpleAssignmentTarget::ComputedMemberExpression(m) => {
                let object = self.eval(&m.object, scope, frame)?;
                let key = self.eval(&m.expression, scope, frame)?.to_property_key();
                Ok(Reference::Property(object, key))
            }
            SimpleAssignmentTarget::PrivateFieldExpression(m) => Ok(Reference::Property(
                self.eval(&m.object, scope, frame)?,
                Rc::from(format!("#{}", m.field.name)),
            )),
            _ => Err(unsupported("assignment target")),
        }
    }

    fn assignment_target(
        &mut self,
        target: &'a AssignmentTarget<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Reference<'a>, Fault<'a>> {
        match target {
            AssignmentTarget::AssignmentTargetIdentifier(id) => {
                Ok(Reference::Binding(id.name.to_string()))
            }
            AssignmentTarget::StaticMemberExpression(m) => Ok(Reference::Property(
                self.eval(&m.object, scope, frame)?,
                Rc::from(m.property.name.as_str()),
            )),
            AssignmentTarget::ComputedMemberExpression(m) => {
                let object = self.eval(&m.object, scope, frame)?;
                let key = self.eval(&m.expression, scope, frame)?.to_property_key();
                Ok(Reference::Property(object, key))
            }
            AssignmentTarget::PrivateFieldExpression(m) => Ok(Reference::Property(
                self.eval(&m.object, scope, frame)?,
                Rc::from(format!("#{}", m.field.name)),
            )),
            _ => Err(unsupported("destructuring assignment")),
        }
    }

    fn read_ref(&mut self, reference: &Reference<'a>, scope: &Scope<'a>) -> Completion<'a> {
        match reference {
            Reference::Binding(name) => lookup(name, scope),
            Reference::Property(object, key) => self.get(object, key),
        }
    }

    fn write_ref(
        &mut self,
        reference: &Reference<'a>,
        value: Value<'a>,
        scope: &Scope<'a>,
    ) -> Result<(), Fault<'a>> {
        match reference {
            Reference::Binding(name) => self.assign_binding(name, value, scope),
            Reference::Property(object, key) => self.set(object, key, value),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MEMBERS, CALLS & OPTIONAL CHAINS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Evaluate one link of a member/call chain as `(receiver, value)`.
    /// `None` means an optional link short-circuited.
    fn eval_link(
        &mut self,
        expr: &'a Expression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Option<(Value<'a>, Value<'a>)>, Fault<'a>> {
        match expr {
            Expression::StaticMemberExpression(m) => self.static_member(m, scope, frame),
            Expression::ComputedMemberExpression(m) => self.computed_member(m, scope, frame),
            Expression::PrivateFieldExpression(m) => self.private_member(m, scope, frame),
            Expression::CallExpression(call) => Ok(self
                .call_link(call, scope, frame)?
                .map(|value| (Value::Undefined, value))),
            other => Ok(Some((Value::Undefined, self.eval(other, scope, frame)?))),
        }
    }

    /// Returns `(receiver, lookup base)`; they differ only for `super`.
    fn member_object(
        &mut self,
        object: &'a Expression<'a>,
        optional: bool,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Option<(Value<'a>, Value<'a>)>, Fault<'a>> {
        if let Expression::Super(_) = object {
            let base = frame
                .home
                .as_ref()
                .and_then(|home| home.borrow().proto.clone())
                .map(Value::Object)
                .unwrap_or(Value::Undefined);
            return Ok(Some((frame.this.clone(), base)));
        }
        let Some((_, value)) = self.eval_link(object, scope, frame)? else {
            return Ok(None);
        };
        if optional && value.is_nullish() {
            return Ok(None);
        }
        Ok(Some((value.clone(), value)))
    }

    fn static_member(
        &mut self,
        m: &'a StaticMemberExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Option<(Value<'a>, Value<'a>)>, Fault<'a>> {
        let Some((receiver, base)) = self.member_object(&m.object, m.optional, scope, frame)? else {
            return Ok(None);
        };
        let value = self.get(&base, m.property.name.as_str())?;
        Ok(Some((receiver, value)))
    }

    fn computed_member(
        &mut self,
        m: &'a ComputedMemberExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Option<(Value<'a>, Value<'a>)>, Fault<'a>> {
        let Some((receiver, base)) = self.member_object(&m.object, m.optional, scope, frame)? else {
            return Ok(None);
        };
        let key = self.eval(&m.expression, scope, frame)?.to_property_key();
        let value = self.get(&base, &key)?;
        Ok(Some((receiver, value)))
    }

    fn private_member(
        &mut self,
        m: &'a PrivateFieldExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Option<(Value<'a>, Value<'a>)>, Fault<'a>> {
        let Some((receiver, base)) = self.member_object(&m.object, m.optional, scope, frame)? else {
            return Ok(None);
        };
        let value = self.get(&base, &format!("#{}", m.field.name))?;
        Ok(Some((receiver, value)))
    }

    fn call_link(
        &mut self,
        call: &'a CallExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Option<Value<'a>>, Fault<'a>> {
        if let Expression::Super(_) = &call.callee {
            let args = self.eval_arguments(&call.arguments, scope, frame)?;
            return self.super_call(args, frame).map(Some);
        }
        let Some((this, callee)) = self.eval_link(&call.callee, scope, frame)? else {
            return Ok(None);
        };
        if call.optional && callee.is_nullish() {
            return Ok(None);
        }
        let args = self.eval_arguments(&call.arguments, scope, frame)?;
        if !callee.is_callable() {
            return Err(type_error(format!(
                "{} is not a function",
                callee_text(&call.callee)
            )));
        }
        self.call(&callee, this, args).map(Some)
    }

    fn eval_chain(
        &mut self,
        chain: &'a ChainExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let result = match &chain.expression {
            ChainElement::CallExpression(call) => self.call_link(call, scope, frame)?,
            ChainElement::StaticMemberExpression(m) => {
                self.static_member(m, scope, frame)?.map(|(_, v)| v)
            }
            ChainElement::ComputedMemberExpression(m) => {
                self.computed_member(m, scope, frame)?.map(|(_, v)| v)
            }
            ChainElement::PrivateFieldExpression(m) => {
                self.private_member(m, scope, frame)?.map(|(_, v)| v)
            }
            _ => return Err(unsupported("this optional chain")),
        };
        Ok(result.unwrap_or(Value::Undefined))
    }

    fn eval_arguments(
        &mut self,
        args: &'a [Argument<'a>],
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<Vec<Value<'a>>, Fault<'a>> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Argument::SpreadElement(spread) => {
                    let value = self.eval(&spread.argument, scope, frame)?;
                    values.extend(self.iterate(&value)?);
                    self.check_array_length(values.len())?;
                }
                _ => {
                    if let Some(expr) = arg.as_expression() {
                        values.push(self.eval(expr, scope, frame)?);
                    }
                }
            }
        }
        Ok(values)
    }

    fn eval_new(
        &mut self,
        n: &'a NewExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let callee = self.eval(&n.callee, scope, frame)?;
        let args = self.eval_arguments(&n.arguments, scope, frame)?;
        if !callee.is_callable() {
            return Err(type_error(format!(
                "{} is not a constructor",
                callee_text(&n.callee)
            )));
        }
        self.construct(&callee, args)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // FUNCTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn make_function(
        &mut self,
        func: &'a Function<'a>,
        scope: &Scope<'a>,
        home: Option<ObjRef<'a>>,
    ) -> Value<'a> {
        self.capture(scope);
        let mut obj = JsObject::new(ObjectKind::Function(Callable::Function {
            func,
            env: Rc::clone(scope),
            home,
        }));
        if let Some(id) = &func.id {
            obj.set_own("name", Value::string(id.name.as_str()));
        }
        obj.set_own("prototype", Value::object(ObjectKind::Ordinary));
        Value::Object(Rc::new(RefCell::new(obj)))
    }

    fn make_arrow(
        &mut self,
        func: &'a ArrowFunctionExpression<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Value<'a> {
        self.capture(scope);
        Value::object(ObjectKind::Function(Callable::Arrow {
            func,
            env: Rc::clone(scope),
            frame: frame.clone(),
        }))
    }

    /// Call `callee` with an explicit `this`.
    pub fn call(
        &mut self,
        callee: &Value<'a>,
        this: Value<'a>,
        args: Vec<Value<'a>>,
    ) -> Completion<'a> {
        let callable = callable_of(callee)
            .ok_or_else(|| type_error(format!("{} is not a function", callee.to_js_string())))?;
        self.enter()?;
        let result = self.invoke(callable, this, args);
        self.leave();
        result
    }

    fn invoke(
        &mut self,
        callable: Callable<'a>,
        this: Value<'a>,
        args: Vec<Value<'a>>,
    ) -> Completion<'a> {
        match callable {
            Callable::Function { func, env, home } => {
                let frame = Frame {
                    this,
                    home,
                    class: None,
                };
                self.call_function(func, &env, &frame, args)
            }
            Callable::Arrow { func, env, frame } => self.call_arrow(func, &env, &frame, args),
            Callable::Native { func, .. } => func(self, this, args),
            Callable::Bound {
                target,
                this: bound_this,
                args: bound_args,
            } => {
                let mut all = bound_args;
                all.extend(args);
                self.call(&target, bound_this, all)
            }
            Callable::Host(component) => {
                let props = args.into_iter().next().unwrap_or(Value::Undefined);
                crate::library::render_host(self, &component, &props)
            }
            Callable::Class(record) => Err(type_error(format!(
                "Class constructor {} cannot be invoked without 'new'",
                record.name
            ))),
        }
    }

    fn call_function(
        &mut self,
        func: &'a Function<'a>,
        env: &Scope<'a>,
        frame: &Frame<'a>,
        args: Vec<Value<'a>>,
    ) -> Completion<'a> {
        if func.generator || func.r#async {
            return Err(unsupported("async functions and generators"));
        }
        let scope = Environment::child(env);
        self.bind_params(&func.params, args, &scope, frame)?;
        let Some(body) = &func.body else {
            return Ok(Value::Undefined);
        };
        match self.exec_block(&body.statements, &scope, frame)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    fn call_arrow(
        &mut self,
        func: &'a ArrowFunctionExpression<'a>,
        env: &Scope<'a>,
        frame: &Frame<'a>,
        args: Vec<Value<'a>>,
    ) -> Completion<'a> {
        if func.r#async {
            return Err(unsupported("async functions and generators"));
        }
        let scope = Environment::child(env);
        self.bind_params(&func.params, args, &scope, frame)?;
        if func.expression {
            return match func.body.statements.first() {
                Some(Statement::ExpressionStatement(s)) => self.eval(&s.expression, &scope, frame),
                _ => Ok(Value::Undefined),
            };
        }
        match self.exec_block(&func.body.statements, &scope, frame)? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    /// `new callee(...args)`.
    pub fn construct(&mut self, callee: &Value<'a>, args: Vec<Value<'a>>) -> Completion<'a> {
        let callable = callable_of(callee).ok_or_else(|| {
            type_error(format!("{} is not a constructor", callee.to_js_string()))
        })?;
        self.enter()?;
        let result = self.construct_with(callable, callee, args);
        self.leave();
        result
    }

    fn construct_with(
        &mut self,
        callable: Callable<'a>,
        callee: &Value<'a>,
        args: Vec<Value<'a>>,
    ) -> Completion<'a> {
        match callable {
            Callable::Class(record) => {
                let this = instance_with_proto(Some(Rc::clone(&record.prototype)));
                self.construct_class(&record, this, args)
            }
            Callable::Function { func, env, home } => {
                let this = self.instance_for(callee)?;
                let frame = Frame {
                    this: this.clone(),
                    home,
                    class: None,
                };
                let result = self.call_function(func, &env, &frame, args)?;
                Ok(if matches!(result, Value::Object(_)) { result } else { this })
            }
            Callable::Native { func, .. } => {
                let this = self.instance_for(callee)?;
                let result = func(self, this.clone(), args)?;
                Ok(if matches!(result, Value::Object(_)) { result } else { this })
            }
            Callable::Bound {
                target,
                args: bound_args,
                ..
            } => {
                let mut all = bound_args;
                all.extend(args);
                self.construct(&target, all)
            }
            Callable::Arrow { .. } | Callable::Host(_) => Err(type_error(format!(
                "{} is not a constructor",
                callee.to_js_string()
            ))),
        }
    }

    fn instance_for(&mut self, ctor: &Value<'a>) -> Completion<'a> {
        let proto = match self.get(ctor, "prototype")? {
            Value::Object(proto) => Some(proto),
            _ => None,
        };
        Ok(instance_with_proto(proto))
    }

    fn construct_class(
        &mut self,
        record: &Rc<ClassRecord<'a>>,
        this: Value<'a>,
        args: Vec<Value<'a>>,
    ) -> Completion<'a> {
        let frame = Frame {
            this: this.clone(),
            home: Some(Rc::clone(&record.prototype)),
            class: Some(Rc::clone(record)),
        };
        match record.constructor {
            Some(ctor) => {
                let scope = Environment::child(&record.env);
                self.bind_params(&ctor.params, args, &scope, &frame)?;
                if record.parent.is_none() {
                    self.init_fields(record, &this)?;
                }
                if let Some(body) = &ctor.body {
                    if let Flow::Return(Value::Object(obj)) =
                        self.exec_block(&body.statements, &scope, &frame)?
                    {
                        return Ok(Value::Object(obj));
                    }
                }
                Ok(this)
            }
            None => {
                if let Some(parent) = &record.parent {
                    self.construct_onto(parent, &this, args)?;
                }
                self.init_fields(record, &this)?;
                Ok(this)
            }
        }
    }

    /// Run a parent constructor against an already allocated `this`.
    fn construct_onto(
        &mut self,
        parent: &Value<'a>,
        this: &Value<'a>,
        args: Vec<Value<'a>>,
    ) -> Result<(), Fault<'a>> {
        self.enter()?;
        let result = match callable_of(parent) {
            Some(Callable::Class(record)) => {
                self.construct_class(&record, this.clone(), args).map(|_| ())
            }
            Some(Callable::Function { func, env, home }) => {
                let frame = Frame {
                    this: this.clone(),
                    home,
                    class: None,
                };
                self.call_function(func, &env, &frame, args).map(|_| ())
            }
            Some(Callable::Native { func, .. }) => func(self, this.clone(), args).map(|_| ()),
            _ => Err(type_error(format!(
                "Class extends value {} is not a constructor or null",
                parent.to_js_string()
            ))),
        };
        self.leave();
        result
    }

    fn super_call(&mut self, args: Vec<Value<'a>>, frame: &Frame<'a>) -> Completion<'a> {
        let Some(class) = &frame.class else {
            return Err(type_error("'super' keyword unexpected here"));
        };
        if let Some(parent) = &class.parent {
            self.construct_onto(parent, &frame.this, args)?;
        }
        self.init_fields(class, &frame.this)?;
        Ok(Value::Undefined)
    }

    fn init_fields(
        &mut self,
        record: &Rc<ClassRecord<'a>>,
        this: &Value<'a>,
    ) -> Result<(), Fault<'a>> {
        let scope = Environment::child(&record.env);
        let frame = Frame {
            this: this.clone(),
            home: Some(Rc::clone(&record.prototype)),
            class: None,
        };
        for field in record.fields.iter().copied() {
            let key = self.property_key(&field.key, &scope, &frame)?;
            let value = match &field.value {
                Some(init) => self.eval(init, &scope, &frame)?,
                None => Value::Undefined,
            };
            self.set(this, &key, value)?;
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CLASSES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Evaluate a class, applying legacy member and class decorators.
    pub fn eval_class(
        &mut self,
        class: &'a Class<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let parent = match &class.super_class {
            Some(expr) => Some(self.eval(expr, scope, frame)?),
            None => None,
        };
        let (parent_proto, parent_ctor) = match &parent {
            None | Some(Value::Null) => (None, None),
            Some(p) if p.is_callable() => match self.get(p, "prototype")? {
                Value::Object(proto) => (Some(proto), p.as_object().cloned()),
                Value::Null => (None, p.as_object().cloned()),
                _ => {
                    return Err(type_error(
                        "Class extends value does not have valid prototype property",
                    ))
                }
            },
            Some(p) => {
                return Err(type_error(format!(
                    "Class extends value {} is not a constructor or null",
                    p.to_js_string()
                )))
            }
        };
        let parent = parent.filter(|p| !matches!(p, Value::Null));

        let name: Rc<str> = class
            .id
            .as_ref()
            .map(|id| Rc::from(id.name.as_str()))
            .unwrap_or_else(|| Rc::from(""));
        let class_scope = Environment::child(scope);
        self.capture(&class_scope);

        let mut prototype = JsObject::new(ObjectKind::Ordinary);
        prototype.proto = parent_proto;
        let prototype = Rc::new(RefCell::new(prototype));

        let mut constructor = None;
        let mut fields = Vec::new();
        for element in class.body.body.iter() {
            match element {
                ClassElement::MethodDefinition(m)
                    if matches!(m.kind, MethodDefinitionKind::Constructor) =>
                {
                    constructor = Some(&*m.value);
                }
                ClassElement::PropertyDefinition(p) if !p.r#static => fields.push(&**p),
                _ => {}
            }
        }

        let record = Rc::new(ClassRecord {
            name: Rc::clone(&name),
            node: class,
            parent,
            prototype: Rc::clone(&prototype),
            env: Rc::clone(&class_scope),
            constructor,
            fields,
        });

        let mut class_obj = JsObject::new(ObjectKind::Function(Callable::Class(Rc::clone(&record))));
        class_obj.proto = parent_ctor;
        class_obj.set_own("prototype", Value::Object(Rc::clone(&prototype)));
        class_obj.set_own("name", Value::String(Rc::clone(&name)));
        let class_ref = Rc::new(RefCell::new(class_obj));
        let class_value = Value::Object(Rc::clone(&class_ref));
        prototype.borrow_mut().set_own("constructor", class_value.clone());
        self.linked.push(Rc::clone(&prototype));
        if !name.is_empty() {
            class_scope.declare(&name, class_value.clone(), false);
        }

        let static_frame = Frame {
            this: class_value.clone(),
            home: Some(Rc::clone(&class_ref)),
            class: None,
        };

        for element in class.body.body.iter() {
            match element {
                ClassElement::MethodDefinition(m) => {
                    match m.kind {
                        MethodDefinitionKind::Constructor => continue,
                        MethodDefinitionKind::Method => {}
                        _ => return Err(unsupported("class accessors")),
                    }
                    let target = if m.r#static {
                        Rc::clone(&class_ref)
                    } else {
                        Rc::clone(&prototype)
                    };
                    let key = self.property_key(&m.key, &class_scope, frame)?;
                    let mut method = self.make_function(&m.value, &class_scope, Some(Rc::clone(&target)));
                    name_anonymous(&method, &key);
                    for decorator in m.decorators.iter().rev() {
                        method = self.decorate_method(decorator, &target, &key, method, &class_scope, frame)?;
                    }
                    target.borrow_mut().set_own(&key, method);
                }
                ClassElement::PropertyDefinition(p) => {
                    let key = self.property_key(&p.key, &class_scope, frame)?;
                    let target = if p.r#static {
                        Rc::clone(&class_ref)
                    } else {
                        Rc::clone(&prototype)
                    };
                    for decorator in p.decorators.iter().rev() {
                        self.decorate_field(decorator, &target, &key, &class_scope, frame)?;
                    }
                    if p.r#static {
                        let value = match &p.value {
                            Some(init) => self.eval(init, &class_scope, &static_frame)?,
                            None => Value::Undefined,
                        };
                        class_ref.borrow_mut().set_own(&key, value);
                    }
                }
                ClassElement::StaticBlock(block) => {
                    let block_scope = Environment::child(&class_scope);
                    self.exec_block(&block.body, &block_scope, &static_frame)?;
                }
                _ => {}
            }
        }

        let mut result = class_value;
        for decorator in class.decorators.iter().rev() {
            let decorator_fn = self.eval(&decorator.expression, scope, frame)?;
            let decorated = self.call(&decorator_fn, Value::Undefined, vec![result.clone()])?;
            if !decorated.is_nullish() {
                result = decorated;
            }
        }
        Ok(result)
    }

    /// Legacy method decorator: `decorator(target, key, descriptor)`.
    fn decorate_method(
        &mut self,
        decorator: &'a Decorator<'a>,
        target: &ObjRef<'a>,
        key: &Rc<str>,
        method: Value<'a>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Completion<'a> {
        let decorator_fn = self.eval(&decorator.expression, scope, frame)?;
        let descriptor = Value::plain_object(vec![
            ("value", method),
            ("writable", Value::Bool(true)),
            ("enumerable", Value::Bool(false)),
            ("configurable", Value::Bool(true)),
        ]);
        let result = self.call(
            &decorator_fn,
            Value::Undefined,
            vec![
                Value::Object(Rc::clone(target)),
                Value::String(Rc::clone(key)),
                descriptor.clone(),
            ],
        )?;
        let descriptor = if matches!(result, Value::Object(_)) {
            result
        } else {
            descriptor
        };
        self.get(&descriptor, "value")
    }

    /// Legacy field decorator; called for its side effects only.
    fn decorate_field(
        &mut self,
        decorator: &'a Decorator<'a>,
        target: &ObjRef<'a>,
        key: &Rc<str>,
        scope: &Scope<'a>,
        frame: &Frame<'a>,
    ) -> Result<(), Fault<'a>> {
        let decorator_fn = self.eval(&decorator.expression, scope, frame)?;
        let descriptor = Value::plain_object(vec![
            ("writable", Value::Bool(true)),
            ("enumerable", Value::Bool(true)),
            ("configurable", Value::Bool(true)),
            ("initializer", Value::Undefined),
        ]);
        self.call(
            &decorator_fn,
            Value::Undefined,
            vec![
                Value::Object(Rc::clone(target)),
                Value::String(Rc::clone(key)),
                descriptor,
            ],
        )?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PROPERTY ACCESS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn get(&self, target: &Value<'a>, key: &str) -> Completion<'a> {
        match target {
            Value::Undefined | Value::Null => Err(type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                target.to_js_string(),
                key
            ))),
            Value::String(s) => Ok(intrinsics::string_property(s, key)),
            Value::Number(_) | Value::Bool(_) => Ok(intrinsics::primitive_property(key)),
            Value::Object(obj) => Ok(property_of(obj, key)),
        }
    }

    pub fn set(&self, target: &Value<'a>, key: &str, value: Value<'a>) -> Result<(), Fault<'a>> {
        match target {
            Value::Object(obj) => {
                set_property(obj, key, value);
                Ok(())
            }
            Value::Undefined | Value::Null => Err(type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                target.to_js_string(),
                key
            ))),
            _ => Ok(()),
        }
    }

    fn add(&self, left: &Value<'a>, right: &Value<'a>) -> Completion<'a> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(_) | Value::Object(_), _) | (_, Value::String(_) | Value::Object(_)) => {
                let (left, right) = (left.to_js_string(), right.to_js_string());
                self.check_string_length(utf16_len(&left) + utf16_len(&right))?;
                Ok(Value::string(&format!("{}{}", left, right)))
            }
            _ => Ok(Value::Number(left.to_number() + right.to_number())),
        }
    }

    /// Spreadable items of an iterable value.
    pub fn iterate(&self, value: &Value<'a>) -> Result<Vec<Value<'a>>, Fault<'a>> {
        match value {
            Value::String(s) => Ok(s.chars().map(|c| Value::string(&c.to_string())).collect()),
            _ => value
                .array_items()
                .ok_or_else(|| type_error(format!("{} is not iterable", value.to_js_string()))),
        }
    }
}

impl Drop for Interpreter<'_> {
    fn drop(&mut self) {
        for prototype in self.linked.drain(..) {
            prototype.borrow_mut().remove_own("constructor");
        }
        for weak in self.captured.drain(..) {
            if let Some(env) = weak.upgrade() {
                env.clear();
            }
        }
        self.global.clear();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

fn lookup<'a>(name: &str, scope: &Scope<'a>) -> Completion<'a> {
    scope.lookup(name).ok_or_else(|| reference_error(name))
}

pub fn callable_of<'a>(value: &Value<'a>) -> Option<Callable<'a>> {
    let Value::Object(obj) = value else {
        return None;
    };
    let obj = obj.borrow();
    match &obj.kind {
        ObjectKind::Function(callable) => Some(callable.clone()),
        _ => None,
    }
}

fn instance_with_proto<'a>(proto: Option<ObjRef<'a>>) -> Value<'a> {
    let mut obj = JsObject::new(ObjectKind::Ordinary);
    obj.proto = proto;
    Value::Object(Rc::new(RefCell::new(obj)))
}

/// Give an anonymous function or class the name it is bound to.
fn name_anonymous(value: &Value<'_>, name: &str) {
    if let Value::Object(obj) = value {
        let mut obj = obj.borrow_mut();
        if matches!(obj.kind, ObjectKind::Function(_)) && !obj.has_own("name") {
            obj.set_own("name", Value::string(name));
        }
    }
}

/// Own, prototype-chain and built-in lookup of `key`.
pub fn property_of<'a>(obj: &ObjRef<'a>, key: &str) -> Value<'a> {
    {
        let o = obj.borrow();
        match &o.kind {
            ObjectKind::Array(items) => {
                if key == "length" {
                    return Value::Number(items.len() as f64);
                }
                if let Some(index) = array_index(key) {
                    return items.get(index).cloned().unwrap_or(Value::Undefined);
                }
            }
            ObjectKind::Element(element) => match key {
                "type" => return element.ty.clone(),
                "props" => return Value::Object(Rc::clone(&element.props)),
                "key" => {
                    return element
                        .key
                        .as_ref()
                        .map(|k| Value::String(Rc::clone(k)))
                        .unwrap_or(Value::Null)
                }
                _ => {}
            },
            _ => {}
        }
        if let Some(value) = o.own(key) {
            return value;
        }
    }

    let mut proto = obj.borrow().proto.clone();
    while let Some(p) = proto {
        if let Some(value) = p.borrow().own(key) {
            return value;
        }
        let next = p.borrow().proto.clone();
        proto = next;
    }

    let builtin = match &obj.borrow().kind {
        ObjectKind::Array(_) => intrinsics::array_method(key),
        ObjectKind::Function(_) => intrinsics::function_method(key),
        _ => None,
    };
    builtin
        .or_else(|| intrinsics::object_method(key))
        .unwrap_or(Value::Undefined)
}

pub fn set_property<'a>(obj: &ObjRef<'a>, key: &str, value: Value<'a>) {
    let mut o = obj.borrow_mut();
    if let ObjectKind::Array(items) = &mut o.kind {
        if key == "length" {
            let len = value.to_number();
            if len.is_finite() && len >= 0.0 && (len as usize) <= MAX_DENSE_INDEX {
                items.resize(len as usize, Value::Undefined);
            }
            return;
        }
        if let Some(index) = array_index(key).filter(|i| *i <= MAX_DENSE_INDEX) {
            if index >= items.len() {
                items.resize(index + 1, Value::Undefined);
            }
            items[index] = value;
            return;
        }
    }
    o.set_own(key, value);
}

fn has_property(obj: &ObjRef<'_>, key: &str) -> bool {
    {
        let o = obj.borrow();
        if let ObjectKind::Array(items) = &o.kind {
            if key == "length" || array_index(key).map_or(false, |i| i < items.len()) {
                return true;
            }
        }
        if o.has_own(key) {
            return true;
        }
    }
    let mut proto = obj.borrow().proto.clone();
    while let Some(p) = proto {
        if p.borrow().has_own(key) {
            return true;
        }
        let next = p.borrow().proto.clone();
        proto = next;
    }
    false
}

/// Enumerable own `(key, value)` pairs, as seen by spread and `Object.entries`.
pub fn own_entries<'a>(value: &Value<'a>) -> Vec<(Rc<str>, Value<'a>)> {
    match value {
        Value::Object(obj) => {
            let o = obj.borrow();
            let mut entries = Vec::new();
            if let ObjectKind::Array(items) = &o.kind {
                for (index, item) in items.iter().enumerate() {
                    entries.push((Rc::from(index.to_string()), item.clone()));
                }
            }
            entries.extend(o.props.iter().cloned());
            entries
        }
        Value::String(s) => s
            .chars()
            .enumerate()
            .map(|(index, c)| (Rc::from(index.to_string()), Value::string(&c.to_string())))
            .collect(),
        _ => Vec::new(),
    }
}


fn compare(left: &Value<'_>, right: &Value<'_>) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

pub fn to_int32(value: &Value<'_>) -> i32 {
    to_uint32(value) as i32
}

pub fn to_uint32(value: &Value<'_>) -> u32 {
    let n = value.to_number();
    if !n.is_finite() {
        return 0;
    }
    (n.trunc().rem_euclid(4_294_967_296.0)) as u32
}

fn compound_operator(op: AssignmentOperator) -> Option<BinaryOperator> {
    Some(match op {
        AssignmentOperator::Addition => BinaryOperator::Addition,
        AssignmentOperator::Subtraction => BinaryOperator::Subtraction,
        AssignmentOperator::Multiplication => BinaryOperator::Multiplication,
        AssignmentOperator::Division => BinaryOperator::Division,
        AssignmentOperator::Remainder => BinaryOperator::Remainder,
        AssignmentOperator::Exponential => BinaryOperator::Exponential,
        AssignmentOperator::ShiftLeft => BinaryOperator::ShiftLeft,
        AssignmentOperator::ShiftRight => BinaryOperator::ShiftRight,
        AssignmentOperator::ShiftRightZeroFill => BinaryOperator::ShiftRightZeroFill,
        AssignmentOperator::BitwiseOR => BinaryOperator::BitwiseOR,
        AssignmentOperator::BitwiseXOR => BinaryOperator::BitwiseXOR,
        AssignmentOperator::BitwiseAnd => BinaryOperator::BitwiseAnd,
        _ => return None,
    })
}

/// Source-like rendering of a callee for "is not a function" messages.
fn callee_text(expr: &Expression<'_>) -> String {
    match expr {
        Expression::Identifier(id) => id.name.to_string(),
        Expression::ThisExpression(_) => "this".to_string(),
        Expression::Super(_) => "super".to_string(),
        Expression::StaticMemberExpression(m) => {
            format!("{}.{}", callee_text(&m.object), m.property.name)
        }
        Expression::ComputedMemberExpression(m) => format!("{}[...]", callee_text(&m.object)),
        Expression::CallExpression(call) => format!("{}(...)", callee_text(&call.callee)),
        Expression::ParenthesizedExpression(p) => callee_text(&p.expression),
        _ => "expression".to_string(),
    }
}
