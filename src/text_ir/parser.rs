//! TIR (Text IR) parser implementation.
//!
//! The format is line oriented: every top-level item, label and instruction
//! sits on its own line. Calls may name functions defined further down the
//! file; those references are resolved once the whole text has been read.

use super::layout::{DataLayout, Type, TypeId};
use super::{Block, Function, Instruction, Operation, SourceFile, TextIR};
use crate::core::{MemcheckError, MemcheckResult};
use std::collections::HashMap;

/// Widest integer type LLVM accepts.
const MAX_INT_BITS: u64 = 1 << 23;

pub fn parse_ir(text: &str) -> MemcheckResult<TextIR> {
    let parser = Parser::new(text);
    parser.parse()
}

struct Parser<'a> {
    text: &'a str,
    line_no: usize,
    ir: TextIR,
    layout_spec: Option<(String, usize)>,

    // Global maps
    funcs: HashMap<String, u32>,
    func_resolves: Vec<Resolve>,
    named_types: HashMap<String, TypeId>,
    interned: HashMap<Type, TypeId>,

    // Per-function state
    open_func: Option<u32>,
    open_block: Option<u32>,
}

/// A call whose callee is looked up after parsing.
#[derive(Debug)]
struct Resolve {
    name: String,
    inst: u32,
    caller: u32,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            line_no: 0,
            ir: TextIR::new(),
            layout_spec: None,
            funcs: HashMap::new(),
            func_resolves: Vec::new(),
            named_types: HashMap::new(),
            interned: HashMap::new(),
            open_func: None,
            open_block: None,
        }
    }

    fn parse(mut self) -> MemcheckResult<TextIR> {
        let text = self.text;
        for (idx, raw) in text.lines().enumerate() {
            self.line_no = idx + 1;
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }

            let result = if self.open_func.is_some() {
                self.parse_body_line(line)
            } else {
                self.parse_top_level(line)
            };
            if let Err(message) = result {
                log::debug!("TIR parse failure at line {}: '{}'", self.line_no, line);
                return Err(self.error(message));
            }
        }

        if let Some(func) = self.open_func {
            let name = &self.ir.functions[func as usize].name;
            return Err(self.error(format!("unterminated body of @{name}")));
        }

        if let Some((spec, line)) = self.layout_spec.take() {
            self.line_no = line;
            self.ir.data_layout = DataLayout::parse(&spec)?;
        }

        self.resolve_all_references()?;

        log::trace!(
            "parsed TIR: {} functions, {} blocks, {} instructions",
            self.ir.functions.len(),
            self.ir.blocks.len(),
            self.ir.insts.len()
        );
        Ok(self.ir)
    }

    fn error(&self, message: String) -> MemcheckError {
        MemcheckError::Parse {
            line: self.line_no,
            message,
        }
    }

    fn parse_top_level(&mut self, line: &str) -> Result<(), String> {
        let mut cursor = Cursor::new(line);

        if cursor.try_keyword("target") {
            if cursor.try_keyword("datalayout") {
                cursor.expect('=')?;
                let spec = cursor.read_quoted()?;
                self.layout_spec = Some((spec, self.line_no));
            }
            // Target triples carry nothing the analysis uses.
            return Ok(());
        }
        if cursor.try_keyword("source_filename") {
            return Ok(());
        }
        if cursor.try_keyword("define") {
            return self.parse_function_header(&mut cursor, false);
        }
        if cursor.try_keyword("declare") {
            return self.parse_function_header(&mut cursor, true);
        }
        if cursor.peek() == Some('%') {
            return self.parse_type_definition(&mut cursor);
        }

        Err(format!("unexpected line '{line}'"))
    }

    fn parse_function_header(&mut self, cursor: &mut Cursor<'_>, declaration: bool) -> Result<(), String> {
        // Linkage, return type and attributes before the name are skipped.
        let at = cursor.rest().find('@').ok_or("expected function name")?;
        cursor.pos += at;
        let name = cursor.read_name('@')?;
        if self.funcs.contains_key(&name) {
            return Err(format!("redefinition of @{name}"));
        }

        if cursor.peek() == Some('(') {
            cursor.skip_balanced('(', ')')?;
        }

        let mut source = None;
        let mut has_body = false;
        loop {
            cursor.skip_whitespace();
            if cursor.is_eof() {
                break;
            }
            if cursor.try_literal("!source") {
                cursor.expect('(')?;
                let directory = cursor.read_quoted()?;
                cursor.expect(',')?;
                let filename = cursor.read_quoted()?;
                cursor.expect(')')?;
                source = Some(SourceFile { directory, filename });
            } else if cursor.try_read('{') {
                has_body = true;
                cursor.skip_whitespace();
                if !cursor.is_eof() {
                    return Err(format!("unexpected '{}' after '{{'", cursor.rest()));
                }
            } else {
                cursor.skip_token();
            }
        }

        if declaration && has_body {
            return Err(format!("declaration of @{name} cannot have a body"));
        }
        if !declaration && !has_body {
            return Err(format!("expected '{{' after definition of @{name}"));
        }

        let idx = self.ir.functions.len() as u32;
        let first_block = self.ir.blocks.len() as u32;
        self.ir.functions.push(Function {
            name: name.clone(),
            declaration,
            source,
            block_begin_idx: first_block,
            block_end_idx: first_block,
        });
        self.funcs.insert(name, idx);

        if !declaration {
            self.open_func = Some(idx);
            self.open_block = None;
        }
        Ok(())
    }

    fn parse_type_definition(&mut self, cursor: &mut Cursor<'_>) -> Result<(), String> {
        let name = cursor.read_name('%')?;
        cursor.expect('=')?;
        if !cursor.try_keyword("type") {
            return Err(format!("expected 'type' in definition of %{name}"));
        }
        if self.named_types.contains_key(&name) {
            return Err(format!("redefinition of type %{name}"));
        }

        let ty = if cursor.try_keyword("opaque") {
            Type::Opaque { name: name.clone() }
        } else {
            let packed = cursor.try_read('<');
            cursor.expect('{')?;
            let fields = self.parse_field_list(cursor, '}')?;
            if packed {
                cursor.expect('>')?;
            }
            Type::Struct {
                name: Some(name.clone()),
                fields,
                packed,
            }
        };

        let id = self.intern(ty);
        self.named_types.insert(name, id);
        Ok(())
    }

    fn parse_body_line(&mut self, line: &str) -> Result<(), String> {
        if line == "}" {
            return self.close_function();
        }
        if let Some(label) = line.strip_suffix(':') {
            if !label.is_empty() && label.chars().all(is_ident_char) {
                self.start_block(label);
                return Ok(());
            }
        }
        self.parse_instruction(line)
    }

    fn start_block(&mut self, name: &str) {
        let idx = self.ir.blocks.len() as u32;
        let first_inst = self.ir.insts.len() as u32;
        self.ir.blocks.push(Block {
            name: name.to_string(),
            inst_begin_idx: first_inst,
            inst_end_idx: first_inst,
        });
        if let Some(func) = self.open_func {
            self.ir.functions[func as usize].block_end_idx = idx + 1;
        }
        self.open_block = Some(idx);
    }

    fn close_function(&mut self) -> Result<(), String> {
        if let Some(func) = self.open_func.take() {
            let func = &self.ir.functions[func as usize];
            if func.block_begin_idx == func.block_end_idx {
                return Err(format!("empty body for @{}", func.name));
            }
        }
        self.open_block = None;
        Ok(())
    }

    fn parse_instruction(&mut self, line: &str) -> Result<(), String> {
        let mut cursor = Cursor::new(line);

        let name = if cursor.peek() == Some('%') {
            let name = cursor.read_name('%')?;
            cursor.expect('=')?;
            Some(name)
        } else {
            None
        };

        let mut opcode = cursor.read_identifier()?;
        if matches!(opcode, "tail" | "musttail" | "notail") {
            if !cursor.try_keyword("call") {
                return Err(format!("expected 'call' after '{opcode}'"));
            }
            opcode = "call";
        }

        let mut callee_name = None;
        let op = match opcode {
            "load" | "store" => {
                while cursor.try_keyword("atomic") || cursor.try_keyword("volatile") {}
                let ty = self.parse_type(&mut cursor)?;
                if opcode == "load" {
                    Operation::Load { ty }
                } else {
                    Operation::Store { ty }
                }
            }
            "call" => {
                callee_name = cursor.read_callee()?;
                Operation::Call { callee: None }
            }
            other => Operation::Other {
                opcode: other.to_string(),
            },
        };

        if self.open_block.is_none() {
            self.start_block("entry");
        }

        let inst = self.ir.insts.len() as u32;
        self.ir.insts.push(Instruction { name, op });
        if let Some(block) = self.open_block {
            self.ir.blocks[block as usize].inst_end_idx = inst + 1;
        }

        if let (Some(name), Some(caller)) = (callee_name, self.open_func) {
            self.func_resolves.push(Resolve { name, inst, caller });
        }
        Ok(())
    }

    fn parse_type(&mut self, cursor: &mut Cursor<'_>) -> Result<TypeId, String> {
        cursor.skip_whitespace();
        match cursor.peek() {
            Some('[') => {
                cursor.advance();
                let len = cursor.read_number()?;
                if !cursor.try_keyword("x") {
                    return Err("expected 'x' in array type".to_string());
                }
                let elem = self.parse_type(cursor)?;
                cursor.expect(']')?;
                Ok(self.intern(Type::Array { len, elem }))
            }
            Some('<') => {
                cursor.advance();
                if cursor.try_read('{') {
                    let fields = self.parse_field_list(cursor, '}')?;
                    cursor.expect('>')?;
                    return Ok(self.intern(Type::Struct {
                        name: None,
                        fields,
                        packed: true,
                    }));
                }
                let len = cursor.read_number()?;
                if !cursor.try_keyword("x") {
                    return Err("expected 'x' in vector type".to_string());
                }
                let elem = self.parse_type(cursor)?;
                if !self.ir.types[elem.0 as usize].is_vector_element() {
                    return Err("vector elements must be integer, floating point or pointer".to_string());
                }
                cursor.expect('>')?;
                Ok(self.intern(Type::Vector { len, elem }))
            }
            Some('{') => {
                cursor.advance();
                let fields = self.parse_field_list(cursor, '}')?;
                Ok(self.intern(Type::Struct {
                    name: None,
                    fields,
                    packed: false,
                }))
            }
            Some('%') => {
                let name = cursor.read_name('%')?;
                self.named_types
                    .get(&name)
                    .copied()
                    .ok_or_else(|| format!("use of undefined type %{name}"))
            }
            _ => {
                let word = cursor.read_identifier()?;
                let ty = match word {
                    "half" => Type::Half,
                    "bfloat" => Type::BFloat,
                    "float" => Type::Float,
                    "double" => Type::Double,
                    "x86_fp80" => Type::X86Fp80,
                    "fp128" => Type::Fp128,
                    "ppc_fp128" => Type::PpcFp128,
                    "ptr" => {
                        let addr_space = if cursor.try_keyword("addrspace") {
                            cursor.expect('(')?;
                            let space = cursor.read_number()?;
                            cursor.expect(')')?;
                            u32::try_from(space).map_err(|_| format!("address space {space} out of range"))?
                        } else {
                            0
                        };
                        Type::Ptr { addr_space }
                    }
                    "void" | "label" | "metadata" | "token" => {
                        return Err(format!("type '{word}' has no in-memory representation"));
                    }
                    int if int.len() > 1 && int.starts_with('i') && int[1..].bytes().all(|b| b.is_ascii_digit()) => {
                        let bits: u64 = int[1..].parse().map_err(|_| format!("invalid integer type '{int}'"))?;
                        if bits == 0 || bits > MAX_INT_BITS {
                            return Err(format!("integer width {bits} out of range"));
                        }
                        Type::Int { bits: bits as u32 }
                    }
                    unknown => return Err(format!("unknown type '{unknown}'")),
                };
                Ok(self.intern(ty))
            }
        }
    }

    fn parse_field_list(&mut self, cursor: &mut Cursor<'_>, close: char) -> Result<Vec<TypeId>, String> {
        let mut fields = Vec::new();
        if cursor.try_read(close) {
            return Ok(fields);
        }
        loop {
            fields.push(self.parse_type(cursor)?);
            if cursor.try_read(',') {
                continue;
            }
            cursor.expect(close)?;
            return Ok(fields);
        }
    }

    fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.interned.get(&ty) {
            return id;
        }
        let id = TypeId(self.ir.types.len() as u32);
        self.ir.types.push(ty.clone());
        self.interned.insert(ty, id);
        id
    }

    fn resolve_all_references(&mut self) -> MemcheckResult<()> {
        for resolve in self.func_resolves.drain(..) {
            match self.funcs.get(&resolve.name) {
                Some(&callee) => {
                    self.ir.insts[resolve.inst as usize].op = Operation::Call {
                        callee: Some(callee),
                    };
                }
                None => {
                    return Err(MemcheckError::UndefinedCallee {
                        caller: self.ir.functions[resolve.caller as usize].name.clone(),
                        callee: resolve.name,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Character cursor over a single line.
struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            self.pos += ch.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Skip one whitespace-delimited token.
    fn skip_token(&mut self) {
        self.advance();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '{' || ch == '!' {
                break;
            }
            self.advance();
        }
    }

    fn skip_balanced(&mut self, open: char, close: char) -> Result<(), String> {
        let mut depth = 0usize;
        while let Some(ch) = self.peek() {
            self.advance();
            if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(format!("missing '{close}'"))
    }

    fn try_read(&mut self, ch: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, ch: char) -> Result<(), String> {
        if !self.try_read(ch) {
            return Err(format!("expected '{}' but found {:?}", ch, self.peek()));
        }
        Ok(())
    }

    fn try_literal(&mut self, literal: &str) -> bool {
        self.skip_whitespace();
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Consume `keyword` only when it is a whole word.
    fn try_keyword(&mut self, keyword: &str) -> bool {
        self.skip_whitespace();
        let rest = self.rest();
        if let Some(after) = rest.strip_prefix(keyword) {
            if !after.chars().next().is_some_and(is_ident_char) {
                self.pos += keyword.len();
                return true;
            }
        }
        false
    }

    fn read_identifier(&mut self) -> Result<&'a str, String> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.advance();
        }
        if start == self.pos {
            return match self.peek() {
                Some(ch) => Err(format!("expected identifier but found '{ch}'")),
                None => Err("expected identifier but found end of line".to_string()),
            };
        }
        Ok(&self.text[start..self.pos])
    }

    fn read_number(&mut self) -> Result<u64, String> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
            self.advance();
        }
        let digits = &self.text[start..self.pos];
        digits
            .parse()
            .map_err(|_| format!("expected number but found {:?}", self.peek()))
    }

    /// Read a double-quoted string; `\"` and `\\` are unescaped.
    fn read_quoted(&mut self) -> Result<String, String> {
        self.expect('"')?;
        let mut value = String::new();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    return Ok(value);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some(ch @ ('"' | '\\')) => {
                            value.push(ch);
                            self.advance();
                        }
                        _ => value.push('\\'),
                    }
                }
                Some(ch) => {
                    value.push(ch);
                    self.advance();
                }
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    /// Read `@name`, `%name` or a quoted form such as `@"name"`.
    fn read_name(&mut self, sigil: char) -> Result<String, String> {
        self.expect(sigil)?;
        if self.peek() == Some('"') {
            return self.read_quoted();
        }
        if !self.peek().is_some_and(is_ident_char) {
            return Err(format!("expected name after '{sigil}'"));
        }
        self.read_identifier().map(str::to_string)
    }

    /// Find the called operand of a call: the first `@`/`%` name followed by
    /// an argument list or the end of the line. `None` means indirect.
    fn read_callee(&mut self) -> Result<Option<String>, String> {
        loop {
            // Inline asm and other unnamed targets count as indirect.
            let Some(offset) = self.rest().find(|ch: char| ch == '@' || ch == '%') else {
                return Ok(None);
            };
            self.pos += offset;
            let sigil = if self.rest().starts_with('@') { '@' } else { '%' };
            let name = self.read_name(sigil)?;
            if self.peek() == Some('(') || self.rest().trim().is_empty() {
                return Ok((sigil == '@').then_some(name));
            }
        }
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '$' | '-')
}

/// Drop a trailing `;` comment, ignoring semicolons inside quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '\\' if in_quotes => escaped = !escaped,
            '"' if !escaped => {
                in_quotes = !in_quotes;
            }
            ';' if !in_quotes => return &line[..idx],
            _ => escaped = false,
        }
        if ch != '\\' {
            escaped = false;
        }
    }
    line
}
