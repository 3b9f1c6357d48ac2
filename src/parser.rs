use crate::emitter::{Emitter, Segment, VmOp};
use crate::error::{CompileError, CompileResult};
use crate::labels::LabelAllocator;
use crate::lexer::{Lexer, Token, TokenKind};
use crate::symbols::{Scopes, StorageClass};

/// The target VM has no native multiply; `*` compiles to a call into this
/// runtime support routine. `print` and `read` are lowered the same way.
/// The VM execution environment supplies all three under the module's
/// namespace.
const MULT_HELPER: &str = "mult";
const PRINT_HELPER: &str = "print";
const READ_HELPER: &str = "read";

/// The function that receives the end-of-program halt idiom.
const ENTRY_FUNCTION: &str = "main";

/// Recursive-descent translator with one token of lookahead. Each
/// nonterminal is a method that checks the tokens the grammar expects and
/// emits VM instructions as a side effect of recognition; there is no AST.
/// Instruction order is the contract: it encodes stack-machine evaluation
/// order.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token<'a>,
    module: &'a str,
    scopes: Scopes,
    labels: LabelAllocator,
    emitter: Emitter,
}

impl<'a> Parser<'a> {
    pub fn new(mut lexer: Lexer<'a>, module: &'a str) -> Self {
        let current = lexer.next();
        Self {
            lexer,
            current,
            module,
            scopes: Scopes::new(),
            labels: LabelAllocator::new(),
            emitter: Emitter::new(),
        }
    }

    /// Translate the whole program and serialize the instruction stream.
    pub fn compile(mut self) -> CompileResult<String> {
        self.program()?;
        Ok(self.emitter.finish())
    }

    fn advance(&mut self) {
        self.current = self.lexer.next();
        log::trace!(
            "line {:>4} {:?} {:?}",
            self.current.line,
            self.current.kind,
            self.current.lexeme
        );
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_tok(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind) -> CompileResult<()> {
        if self.match_tok(kind) {
            Ok(())
        } else {
            Err(self.error_expected(kind.to_string()))
        }
    }

    fn error_expected(&self, expected: impl Into<String>) -> CompileError {
        CompileError::Syntax {
            expected: expected.into(),
            found: self.current.describe(),
            line: self.current.line,
        }
    }

    fn qualified(&self, name: &str) -> String {
        format!("{}.{}", self.module, name)
    }

    fn resolve(&self, name: &str, line: u32) -> CompileResult<(StorageClass, u32)> {
        self.scopes.resolve(name).ok_or_else(|| CompileError::Undefined {
            name: name.to_string(),
            line,
        })
    }

    /// `program := PROGRAM staticVarDefs funDefinitionList ENDPROGRAM`
    fn program(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::Program)?;
        while self.check(TokenKind::Int) {
            self.var_def(StorageClass::Static)?;
        }
        while self.check(TokenKind::Def) {
            self.fun_definition()?;
        }
        self.consume(TokenKind::EndProgram)?;
        self.consume(TokenKind::Eof)
    }

    /// `varDef := INT name`, declared into the given scope.
    fn var_def(&mut self, class: StorageClass) -> CompileResult<()> {
        self.consume(TokenKind::Int)?;
        let (name, line) = self.recognize_variable()?;
        if self.scopes.define(class, name).is_none() {
            return Err(CompileError::Redefined {
                name: name.to_string(),
                line,
            });
        }
        Ok(())
    }

    /// `funDefinition := DEF name ( varDefList ) varDefList statementList ENDDEF`
    ///
    /// The header records the local count, not the argument count: the
    /// calling convention allocates only locals in the callee frame. Every
    /// body ends with a defensive return; the entry function also gets a
    /// self-loop after its return as the halt idiom.
    fn fun_definition(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::Def)?;
        let (name, _) = self.recognize_variable()?;
        self.scopes.begin_function();
        self.consume(TokenKind::LParen)?;
        while self.check(TokenKind::Int) {
            self.var_def(StorageClass::Argument)?;
        }
        self.consume(TokenKind::RParen)?;
        while self.check(TokenKind::Int) {
            self.var_def(StorageClass::Local)?;
        }
        let header = self.qualified(name);
        let local_count = self.scopes.local_count();
        self.emitter.function(&header, local_count);
        self.statement_list()?;
        self.consume(TokenKind::EndDef)?;
        self.emitter.push(Segment::Constant, 0);
        self.emitter.ret();
        if name == ENTRY_FUNCTION {
            let halt = self.labels.fresh();
            self.emitter.label(&halt);
            self.emitter.goto(&halt);
        }
        Ok(())
    }

    /// `statementList := statement*`. Stops at the first token that cannot
    /// start a statement; the enclosing production rejects it if it is not
    /// the expected terminator.
    fn statement_list(&mut self) -> CompileResult<()> {
        loop {
            match self.current.kind {
                TokenKind::Variable => self.assignment()?,
                TokenKind::Call => self.call_statement()?,
                TokenKind::Return => self.return_statement()?,
                TokenKind::While => self.while_statement()?,
                TokenKind::Repeat => self.repeat_statement()?,
                TokenKind::If => self.if_statement()?,
                TokenKind::Print => self.print_statement()?,
                TokenKind::Read => self.read_statement()?,
                _ => return Ok(()),
            }
        }
    }

    /// `assignment := name ASSIGN expr`: evaluate the right-hand side,
    /// then pop the value into the variable's slot.
    fn assignment(&mut self) -> CompileResult<()> {
        let (name, line) = self.recognize_variable()?;
        let (class, offset) = self.resolve(name, line)?;
        self.consume(TokenKind::Assign)?;
        self.expression()?;
        self.emitter.pop(class.into(), offset);
        Ok(())
    }

    /// `CALL name ( exprList )`: statement context, so the return value is
    /// popped into a scratch slot and discarded.
    fn call_statement(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::Call)?;
        let (name, _) = self.recognize_variable()?;
        let target = self.qualified(name);
        self.consume(TokenKind::LParen)?;
        let args = self.expr_list()?;
        self.consume(TokenKind::RParen)?;
        self.emitter.call(&target, args);
        self.discard_result();
        Ok(())
    }

    /// `RETURN name`
    fn return_statement(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::Return)?;
        let (name, line) = self.recognize_variable()?;
        let (class, offset) = self.resolve(name, line)?;
        self.emitter.push(class.into(), offset);
        self.emitter.ret();
        Ok(())
    }

    /// `WHILE condition statementList ENDWHILE`
    fn while_statement(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::While)?;
        let top = self.labels.fresh();
        let exit = self.labels.fresh();
        self.emitter.label(&top);
        self.condition()?;
        self.emitter.if_goto(&exit);
        self.statement_list()?;
        self.consume(TokenKind::EndWhile)?;
        self.emitter.goto(&top);
        self.emitter.label(&exit);
        Ok(())
    }

    /// `REPEAT statementList UNTIL condition`: the body runs before the
    /// first test. The condition leaves its branch-if-false value, so one
    /// extra `not` turns the exit branch into "condition became true".
    fn repeat_statement(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::Repeat)?;
        let top = self.labels.fresh();
        let exit = self.labels.fresh();
        self.emitter.label(&top);
        self.statement_list()?;
        self.consume(TokenKind::Until)?;
        self.condition()?;
        self.emitter.op(VmOp::Not);
        self.emitter.if_goto(&exit);
        self.emitter.goto(&top);
        self.emitter.label(&exit);
        Ok(())
    }

    /// `IF condition statementList ELSE statementList ENDIF`: both branches
    /// are required.
    fn if_statement(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::If)?;
        let else_label = self.labels.fresh();
        let end_label = self.labels.fresh();
        self.condition()?;
        self.emitter.if_goto(&else_label);
        self.statement_list()?;
        self.consume(TokenKind::Else)?;
        self.emitter.goto(&end_label);
        self.emitter.label(&else_label);
        self.statement_list()?;
        self.consume(TokenKind::EndIf)?;
        self.emitter.label(&end_label);
        Ok(())
    }

    /// `PRINT ( expr )`, lowered to the runtime print routine.
    fn print_statement(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::Print)?;
        self.consume(TokenKind::LParen)?;
        self.expression()?;
        self.consume(TokenKind::RParen)?;
        let target = self.qualified(PRINT_HELPER);
        self.emitter.call(&target, 1);
        self.discard_result();
        Ok(())
    }

    /// `READ name`, lowered to the runtime read routine; its result lands
    /// in the named variable.
    fn read_statement(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::Read)?;
        let (name, line) = self.recognize_variable()?;
        let (class, offset) = self.resolve(name, line)?;
        let target = self.qualified(READ_HELPER);
        self.emitter.call(&target, 0);
        self.emitter.pop(class.into(), offset);
        Ok(())
    }

    /// `condition := ( expr compareOp expr )`
    ///
    /// The branch that follows a condition is taken when the condition is
    /// FALSE. Strict `==`/`>`/`<` therefore negate the comparison result,
    /// while `!=`/`<=`/`>=` compile to the inverse primitive directly and
    /// need no `not`.
    fn condition(&mut self) -> CompileResult<()> {
        self.consume(TokenKind::LParen)?;
        self.expression()?;
        let op = self.current.kind;
        match op {
            TokenKind::Eq
            | TokenKind::Neq
            | TokenKind::Gt
            | TokenKind::Ge
            | TokenKind::Lt
            | TokenKind::Le => self.advance(),
            _ => return Err(self.error_expected("comparison operator")),
        }
        self.expression()?;
        self.consume(TokenKind::RParen)?;
        match op {
            TokenKind::Eq => {
                self.emitter.op(VmOp::Eq);
                self.emitter.op(VmOp::Not);
            }
            TokenKind::Neq => self.emitter.op(VmOp::Eq),
            TokenKind::Gt => {
                self.emitter.op(VmOp::Gt);
                self.emitter.op(VmOp::Not);
            }
            TokenKind::Le => self.emitter.op(VmOp::Gt),
            TokenKind::Lt => {
                self.emitter.op(VmOp::Lt);
                self.emitter.op(VmOp::Not);
            }
            TokenKind::Ge => self.emitter.op(VmOp::Lt),
            _ => unreachable!("checked above"),
        }
        Ok(())
    }

    /// `expr := term ( (PLUS|MINUS) term )*`, left-associative; the
    /// operator is emitted after its right operand (postfix order).
    fn expression(&mut self) -> CompileResult<()> {
        self.term()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => VmOp::Add,
                TokenKind::Minus => VmOp::Sub,
                _ => return Ok(()),
            };
            self.advance();
            self.term()?;
            self.emitter.op(op);
        }
    }

    /// `term := factor ( MULT factor )*`
    fn term(&mut self) -> CompileResult<()> {
        self.factor()?;
        while self.match_tok(TokenKind::Star) {
            self.factor()?;
            let target = self.qualified(MULT_HELPER);
            self.emitter.call(&target, 2);
        }
        Ok(())
    }

    /// `factor := name | constant | ( expr ) | CALLF name ( exprList )`
    fn factor(&mut self) -> CompileResult<()> {
        match self.current.kind {
            TokenKind::Variable => {
                let (name, line) = self.recognize_variable()?;
                let (class, offset) = self.resolve(name, line)?;
                self.emitter.push(class.into(), offset);
            }
            TokenKind::Constant => {
                let value = self.recognize_constant()?;
                self.emitter.push(Segment::Constant, value);
            }
            TokenKind::Callf => {
                self.advance();
                let (name, _) = self.recognize_variable()?;
                let target = self.qualified(name);
                self.consume(TokenKind::LParen)?;
                let args = self.expr_list()?;
                self.consume(TokenKind::RParen)?;
                self.emitter.call(&target, args);
            }
            _ => {
                self.consume(TokenKind::LParen)?;
                self.expression()?;
                self.consume(TokenKind::RParen)?;
            }
        }
        Ok(())
    }

    /// `exprList := expr*`: whitespace-separated, no commas; each
    /// expression extends as far as the grammar allows.
    fn expr_list(&mut self) -> CompileResult<u32> {
        let mut count = 0;
        while matches!(
            self.current.kind,
            TokenKind::Variable | TokenKind::Constant | TokenKind::LParen | TokenKind::Callf
        ) {
            self.expression()?;
            count += 1;
        }
        Ok(count)
    }

    fn recognize_variable(&mut self) -> CompileResult<(&'a str, u32)> {
        if self.check(TokenKind::Variable) {
            let name = self.current.lexeme;
            let line = self.current.line;
            self.advance();
            Ok((name, line))
        } else {
            Err(self.error_expected(TokenKind::Variable.to_string()))
        }
    }

    fn recognize_constant(&mut self) -> CompileResult<u32> {
        if self.check(TokenKind::Constant) {
            let literal = self.current.lexeme;
            let line = self.current.line;
            let value = literal.parse().map_err(|_| CompileError::BadConstant {
                literal: literal.to_string(),
                line,
            })?;
            self.advance();
            Ok(value)
        } else {
            Err(self.error_expected(TokenKind::Constant.to_string()))
        }
    }

    fn discard_result(&mut self) {
        self.emitter.pop(Segment::Temp, 0);
    }
}
