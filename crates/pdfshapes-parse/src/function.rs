//! PDF function evaluation (types 0, 2, 3 and 4).
//!
//! Functions drive Separation/DeviceN tint transforms and shading color
//! ramps. Evaluation never panics: malformed input yields `None`.

use std::sync::Arc;

use lopdf::{Dictionary, Document, Object};

use crate::error::BackendError;
use crate::objects::{as_dict, decode_stream, dict_number, dict_numbers, resolve_ref};

/// Nesting limit for stitching functions referring to other functions.
const MAX_FUNCTION_DEPTH: usize = 8;
/// Operand stack limit for PostScript calculator functions.
const MAX_PS_STACK: usize = 100;

/// A parsed PDF function.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfFunction {
    Sampled(SampledFunction),
    Exponential(ExponentialFunction),
    Stitching(StitchingFunction),
    PostScript(PostScriptFunction),
}

/// Type 0: a table of samples with multilinear interpolation.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFunction {
    domain: Vec<f64>,
    range: Vec<f64>,
    size: Vec<usize>,
    bits_per_sample: u32,
    encode: Vec<f64>,
    decode: Vec<f64>,
    /// Raw sample values, `n_outputs` per grid point.
    samples: Vec<f64>,
}

/// Type 2: `C0 + x^N · (C1 − C0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialFunction {
    domain: Vec<f64>,
    range: Option<Vec<f64>>,
    c0: Vec<f64>,
    c1: Vec<f64>,
    n: f64,
}

/// Type 3: one-input functions stitched over subdomains.
#[derive(Debug, Clone, PartialEq)]
pub struct StitchingFunction {
    domain: Vec<f64>,
    range: Option<Vec<f64>>,
    functions: Vec<PdfFunction>,
    bounds: Vec<f64>,
    encode: Vec<f64>,
}

/// Type 4: a PostScript calculator program.
#[derive(Debug, Clone, PartialEq)]
pub struct PostScriptFunction {
    domain: Vec<f64>,
    range: Vec<f64>,
    program: Vec<PsOp>,
}

#[derive(Debug, Clone, PartialEq)]
enum PsOp {
    Number(f64),
    Bool(bool),
    Op(String),
    If(Vec<PsOp>),
    IfElse(Vec<PsOp>, Vec<PsOp>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PsValue {
    Num(f64),
    Bool(bool),
}

impl PdfFunction {
    /// Parse a function dictionary or stream.
    pub fn parse(doc: &Document, obj: &Object) -> Result<Self, BackendError> {
        parse_function(doc, obj, 0)
    }

    /// Evaluate the function. Inputs are clipped to the domain and outputs
    /// to the range.
    pub fn evaluate(&self, input: &[f32]) -> Option<Vec<f32>> {
        let input: Vec<f64> = input.iter().map(|&v| f64::from(v)).collect();
        let out = self.eval(&input)?;
        if out.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(out.into_iter().map(|v| v as f32).collect())
    }

    fn eval(&self, input: &[f64]) -> Option<Vec<f64>> {
        match self {
            PdfFunction::Sampled(f) => f.eval(input),
            PdfFunction::Exponential(f) => f.eval(input),
            PdfFunction::Stitching(f) => f.eval(input),
            PdfFunction::PostScript(f) => f.eval(input),
        }
    }
}

/// The /Function entry of a shading: one n-output function or an array of
/// n one-output functions.
#[derive(Debug, Clone, PartialEq)]
pub enum ShadingFunction {
    Single(Arc<PdfFunction>),
    PerComponent(Vec<Arc<PdfFunction>>),
}

impl ShadingFunction {
    pub fn parse(doc: &Document, obj: &Object) -> Result<Self, BackendError> {
        match resolve_ref(doc, obj) {
            Object::Array(items) => {
                let functions = items
                    .iter()
                    .map(|o| PdfFunction::parse(doc, o).map(Arc::new))
                    .collect::<Result<Vec<_>, _>>()?;
                if functions.is_empty() {
                    return Err(BackendError::Parse("empty function array".to_string()));
                }
                Ok(ShadingFunction::PerComponent(functions))
            }
            other => Ok(ShadingFunction::Single(Arc::new(PdfFunction::parse(
                doc, other,
            )?))),
        }
    }

    pub fn evaluate(&self, input: &[f32]) -> Option<Vec<f32>> {
        match self {
            ShadingFunction::Single(f) => f.evaluate(input),
            ShadingFunction::PerComponent(fs) => {
                let mut out = Vec::with_capacity(fs.len());
                for f in fs {
                    out.push(*f.evaluate(input)?.first()?);
                }
                Some(out)
            }
        }
    }
}

fn parse_function(doc: &Document, obj: &Object, depth: usize) -> Result<PdfFunction, BackendError> {
    if depth > MAX_FUNCTION_DEPTH {
        return Err(BackendError::Parse("function nesting too deep".to_string()));
    }
    let obj = resolve_ref(doc, obj);
    let dict = as_dict(obj)
        .ok_or_else(|| BackendError::Parse("function is not a dictionary or stream".to_string()))?;
    let function_type = dict_number(doc, dict, b"FunctionType")
        .ok_or_else(|| BackendError::Parse("function has no /FunctionType".to_string()))?;
    let domain = dict_numbers(doc, dict, b"Domain")
        .filter(|d| d.len() >= 2 && d.len() % 2 == 0)
        .ok_or_else(|| BackendError::Parse("function has no valid /Domain".to_string()))?;
    let range = dict_numbers(doc, dict, b"Range").filter(|r| r.len() % 2 == 0 && !r.is_empty());

    match function_type as i64 {
        0 => {
            let stream = obj
                .as_stream()
                .map_err(|_| BackendError::Parse("sampled function is not a stream".to_string()))?;
            parse_sampled(doc, dict, domain, range, &decode_stream(stream)?)
                .map(PdfFunction::Sampled)
        }
        2 => {
            let c0 = dict_numbers(doc, dict, b"C0").unwrap_or_else(|| vec![0.0]);
            let c1 = dict_numbers(doc, dict, b"C1").unwrap_or_else(|| vec![1.0]);
            if c0.len() != c1.len() {
                return Err(BackendError::Parse("/C0 and /C1 differ in length".to_string()));
            }
            let n = dict_number(doc, dict, b"N")
                .ok_or_else(|| BackendError::Parse("exponential function has no /N".to_string()))?;
            Ok(PdfFunction::Exponential(ExponentialFunction {
                domain,
                range,
                c0,
                c1,
                n,
            }))
        }
        3 => parse_stitching(doc, dict, domain, range, depth).map(PdfFunction::Stitching),
        4 => {
            let stream = obj.as_stream().map_err(|_| {
                BackendError::Parse("PostScript function is not a stream".to_string())
            })?;
            let range = range.ok_or_else(|| {
                BackendError::Parse("PostScript function has no /Range".to_string())
            })?;
            let program = parse_ps_program(&decode_stream(stream)?)?;
            Ok(PdfFunction::PostScript(PostScriptFunction {
                domain,
                range,
                program,
            }))
        }
        other => Err(BackendError::Parse(format!(
            "unsupported function type {other}"
        ))),
    }
}

fn parse_sampled(
    doc: &Document,
    dict: &Dictionary,
    domain: Vec<f64>,
    range: Option<Vec<f64>>,
    data: &[u8],
) -> Result<SampledFunction, BackendError> {
    let range = range.ok_or_else(|| BackendError::Parse("sampled function has no /Range".to_string()))?;
    let m = domain.len() / 2;
    let size: Vec<usize> = dict_numbers(doc, dict, b"Size")
        .filter(|s| s.len() == m && s.iter().all(|&v| v >= 1.0))
        .ok_or_else(|| BackendError::Parse("sampled function has no valid /Size".to_string()))?
        .into_iter()
        .map(|v| v as usize)
        .collect();
    let bits_per_sample = dict_number(doc, dict, b"BitsPerSample").unwrap_or(0.0) as u32;
    if !matches!(bits_per_sample, 1 | 2 | 4 | 8 | 12 | 16 | 24 | 32) {
        return Err(BackendError::Parse(format!(
            "invalid /BitsPerSample {bits_per_sample}"
        )));
    }
    let encode = dict_numbers(doc, dict, b"Encode")
        .filter(|e| e.len() == 2 * m)
        .unwrap_or_else(|| size.iter().flat_map(|&s| [0.0, (s - 1) as f64]).collect());
    let decode = dict_numbers(doc, dict, b"Decode")
        .filter(|d| d.len() == range.len())
        .unwrap_or_else(|| range.clone());

    let n = range.len() / 2;
    let count = size
        .iter()
        .try_fold(n, |acc, &s| acc.checked_mul(s))
        .filter(|&c| c <= 1 << 24)
        .ok_or_else(|| BackendError::Parse("sampled function table too large".to_string()))?;
    let mut reader = BitReader::new(data);
    let samples = (0..count)
        .map(|_| reader.read(bits_per_sample).map(|v| v as f64))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| BackendError::Parse("sampled function data too short".to_string()))?;

    Ok(SampledFunction {
        domain,
        range,
        size,
        bits_per_sample,
        encode,
        decode,
        samples,
    })
}

fn parse_stitching(
    doc: &Document,
    dict: &Dictionary,
    domain: Vec<f64>,
    range: Option<Vec<f64>>,
    depth: usize,
) -> Result<StitchingFunction, BackendError> {
    let items = dict
        .get(b"Functions")
        .ok()
        .and_then(|o| resolve_ref(doc, o).as_array().ok())
        .ok_or_else(|| BackendError::Parse("stitching function has no /Functions".to_string()))?;
    let functions = items
        .iter()
        .map(|o| parse_function(doc, o, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;
    let k = functions.len();
    let bounds = dict_numbers(doc, dict, b"Bounds").unwrap_or_default();
    let encode = dict_numbers(doc, dict, b"Encode").unwrap_or_default();
    if k == 0 || bounds.len() != k - 1 || encode.len() != 2 * k {
        return Err(BackendError::Parse(
            "stitching function /Functions, /Bounds and /Encode disagree".to_string(),
        ));
    }
    Ok(StitchingFunction {
        domain,
        range,
        functions,
        bounds,
        encode,
    })
}

/// Clip every value to its `[min, max]` pair.
fn clip_to(values: &mut [f64], limits: &[f64]) {
    for (v, pair) in values.iter_mut().zip(limits.chunks(2)) {
        *v = v.clamp(pair[0].min(pair[1]), pair[0].max(pair[1]));
    }
}

/// Linear map of `x` from `[x0, x1]` onto `[y0, y1]`.
fn interpolate(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if x1 == x0 {
        y0
    } else {
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }
}

impl SampledFunction {
    fn eval(&self, input: &[f64]) -> Option<Vec<f64>> {
        let m = self.size.len();
        if input.len() < m {
            return None;
        }
        let n = self.range.len() / 2;
        let mut x = input[..m].to_vec();
        clip_to(&mut x, &self.domain);

        // grid cell and fraction per input
        let mut base = Vec::with_capacity(m);
        let mut frac = Vec::with_capacity(m);
        for (j, &xj) in x.iter().enumerate() {
            let e = interpolate(
                xj,
                self.domain[2 * j],
                self.domain[2 * j + 1],
                self.encode[2 * j],
                self.encode[2 * j + 1],
            );
            let max = (self.size[j] - 1) as f64;
            let e = e.clamp(0.0, max);
            let cell = if self.size[j] == 1 {
                0.0
            } else {
                e.floor().min(max - 1.0)
            };
            base.push(cell as usize);
            frac.push(e - cell);
        }

        let mut out = vec![0.0; n];
        for corner in 0..(1usize << m) {
            let mut weight = 1.0;
            let mut index = 0;
            let mut stride = 1;
            for j in 0..m {
                let up = corner >> j & 1 == 1;
                weight *= if up { frac[j] } else { 1.0 - frac[j] };
                let pos = (base[j] + usize::from(up)).min(self.size[j] - 1);
                index += pos * stride;
                stride *= self.size[j];
            }
            if weight == 0.0 {
                continue;
            }
            for (o, slot) in out.iter_mut().enumerate() {
                *slot += weight * self.samples.get(index * n + o)?;
            }
        }

        let max_sample = (2f64).powi(self.bits_per_sample as i32) - 1.0;
        for (o, v) in out.iter_mut().enumerate() {
            *v = interpolate(
                *v,
                0.0,
                max_sample,
                self.decode[2 * o],
                self.decode[2 * o + 1],
            );
        }
        clip_to(&mut out, &self.range);
        Some(out)
    }
}

impl ExponentialFunction {
    fn eval(&self, input: &[f64]) -> Option<Vec<f64>> {
        let mut x = [*input.first()?];
        clip_to(&mut x, &self.domain);
        let x = x[0];
        if x < 0.0 && self.n.fract() != 0.0 {
            return None;
        }
        if x == 0.0 && self.n < 0.0 {
            return None;
        }
        let xn = x.powf(self.n);
        let mut out: Vec<f64> = self
            .c0
            .iter()
            .zip(&self.c1)
            .map(|(c0, c1)| c0 + xn * (c1 - c0))
            .collect();
        if let Some(range) = &self.range {
            clip_to(&mut out, range);
        }
        Some(out)
    }
}

impl StitchingFunction {
    fn eval(&self, input: &[f64]) -> Option<Vec<f64>> {
        let mut x = [*input.first()?];
        clip_to(&mut x, &self.domain);
        let x = x[0];
        let k = self
            .bounds
            .iter()
            .position(|&b| x < b)
            .unwrap_or(self.bounds.len());
        let lo = if k == 0 { self.domain[0] } else { self.bounds[k - 1] };
        let hi = self.bounds.get(k).copied().unwrap_or(self.domain[1]);
        let t = interpolate(x, lo, hi, self.encode[2 * k], self.encode[2 * k + 1]);
        let mut out = self.functions.get(k)?.eval(&[t])?;
        if let Some(range) = &self.range {
            clip_to(&mut out, range);
        }
        Some(out)
    }
}

impl PostScriptFunction {
    fn eval(&self, input: &[f64]) -> Option<Vec<f64>> {
        let m = self.domain.len() / 2;
        if input.len() < m {
            return None;
        }
        let mut x = input[..m].to_vec();
        clip_to(&mut x, &self.domain);
        let mut stack: Vec<PsValue> = x.into_iter().map(PsValue::Num).collect();
        run_ps(&self.program, &mut stack)?;

        let n = self.range.len() / 2;
        if stack.len() < n {
            return None;
        }
        let mut out = stack[stack.len() - n..]
            .iter()
            .map(|v| match v {
                PsValue::Num(f) => Some(*f),
                PsValue::Bool(_) => None,
            })
            .collect::<Option<Vec<f64>>>()?;
        clip_to(&mut out, &self.range);
        Some(out)
    }
}

/// Big-endian bit reader for sampled function tables.
struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    fn read(&mut self, bits: u32) -> Option<u32> {
        let mut value: u32 = 0;
        for _ in 0..bits {
            let byte = *self.data.get(self.bit_pos / 8)?;
            let bit = (byte >> (7 - self.bit_pos % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.bit_pos += 1;
        }
        Some(value)
    }
}

fn parse_ps_program(data: &[u8]) -> Result<Vec<PsOp>, BackendError> {
    let text = String::from_utf8_lossy(data);
    let mut tokens = Vec::new();
    for raw in text.split(|c: char| c.is_ascii_whitespace()) {
        // braces may be glued to neighbouring tokens
        let mut rest = raw;
        while !rest.is_empty() {
            if let Some(pos) = rest.find(['{', '}']) {
                if pos > 0 {
                    tokens.push(&rest[..pos]);
                }
                tokens.push(&rest[pos..pos + 1]);
                rest = &rest[pos + 1..];
            } else {
                tokens.push(rest);
                break;
            }
        }
    }

    let mut iter = tokens.into_iter();
    if iter.next() != Some("{") {
        return Err(BackendError::Parse(
            "PostScript function must start with '{'".to_string(),
        ));
    }
    parse_ps_block(&mut iter, 0)
}

fn parse_ps_block<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    depth: usize,
) -> Result<Vec<PsOp>, BackendError> {
    if depth > MAX_PS_STACK {
        return Err(BackendError::Parse("PostScript blocks nested too deep".to_string()));
    }
    let mut ops = Vec::new();
    // completed sub-blocks awaiting `if`/`ifelse`
    let mut pending: Vec<Vec<PsOp>> = Vec::new();
    while let Some(tok) = tokens.next() {
        match tok {
            "{" => pending.push(parse_ps_block(tokens, depth + 1)?),
            "}" => return Ok(ops),
            "if" => {
                let block = pending
                    .pop()
                    .ok_or_else(|| BackendError::Parse("'if' without a block".to_string()))?;
                ops.push(PsOp::If(block));
            }
            "ifelse" => {
                let else_block = pending.pop();
                let then_block = pending.pop();
                let (Some(t), Some(e)) = (then_block, else_block) else {
                    return Err(BackendError::Parse("'ifelse' needs two blocks".to_string()));
                };
                ops.push(PsOp::IfElse(t, e));
            }
            "true" => ops.push(PsOp::Bool(true)),
            "false" => ops.push(PsOp::Bool(false)),
            _ => match tok.parse::<f64>() {
                Ok(v) => ops.push(PsOp::Number(v)),
                Err(_) => ops.push(PsOp::Op(tok.to_string())),
            },
        }
    }
    Err(BackendError::Parse(
        "unterminated PostScript block".to_string(),
    ))
}

fn run_ps(program: &[PsOp], stack: &mut Vec<PsValue>) -> Option<()> {
    for op in program {
        match op {
            PsOp::Number(v) => stack.push(PsValue::Num(*v)),
            PsOp::Bool(b) => stack.push(PsValue::Bool(*b)),
            PsOp::If(block) => {
                if pop_bool(stack)? {
                    run_ps(block, stack)?;
                }
            }
            PsOp::IfElse(then_block, else_block) => {
                if pop_bool(stack)? {
                    run_ps(then_block, stack)?;
                } else {
                    run_ps(else_block, stack)?;
                }
            }
            PsOp::Op(name) => run_ps_operator(name, stack)?,
        }
        if stack.len() > MAX_PS_STACK {
            return None;
        }
    }
    Some(())
}

fn pop_num(stack: &mut Vec<PsValue>) -> Option<f64> {
    match stack.pop()? {
        PsValue::Num(v) => Some(v),
        PsValue::Bool(_) => None,
    }
}

fn pop_bool(stack: &mut Vec<PsValue>) -> Option<bool> {
    match stack.pop()? {
        PsValue::Bool(b) => Some(b),
        PsValue::Num(_) => None,
    }
}

fn run_ps_operator(name: &str, stack: &mut Vec<PsValue>) -> Option<()> {
    use PsValue::{Bool, Num};

    let unary = |stack: &mut Vec<PsValue>, f: fn(f64) -> f64| -> Option<()> {
        let a = pop_num(stack)?;
        stack.push(Num(f(a)));
        Some(())
    };
    let binary = |stack: &mut Vec<PsValue>, f: fn(f64, f64) -> f64| -> Option<()> {
        let b = pop_num(stack)?;
        let a = pop_num(stack)?;
        stack.push(Num(f(a, b)));
        Some(())
    };
    let compare = |stack: &mut Vec<PsValue>, f: fn(f64, f64) -> bool| -> Option<()> {
        let b = pop_num(stack)?;
        let a = pop_num(stack)?;
        stack.push(Bool(f(a, b)));
        Some(())
    };

    match name {
        "abs" => unary(stack, f64::abs),
        "neg" => unary(stack, |a| -a),
        "ceiling" => unary(stack, f64::ceil),
        "floor" => unary(stack, f64::floor),
        "round" => unary(stack, |a| (a + 0.5).floor()),
        "truncate" | "cvi" => unary(stack, f64::trunc),
        "cvr" => unary(stack, |a| a),
        "sqrt" => unary(stack, f64::sqrt),
        "sin" => unary(stack, |a| a.to_radians().sin()),
        "cos" => unary(stack, |a| a.to_radians().cos()),
        "ln" => unary(stack, f64::ln),
        "log" => unary(stack, f64::log10),
        "add" => binary(stack, |a, b| a + b),
        "sub" => binary(stack, |a, b| a - b),
        "mul" => binary(stack, |a, b| a * b),
        "div" => binary(stack, |a, b| if b == 0.0 { 0.0 } else { a / b }),
        "idiv" => binary(stack, |a, b| {
            if b.trunc() == 0.0 {
                0.0
            } else {
                (a.trunc() / b.trunc()).trunc()
            }
        }),
        "mod" => binary(stack, |a, b| {
            if b.trunc() == 0.0 {
                0.0
            } else {
                a.trunc() % b.trunc()
            }
        }),
        "exp" => binary(stack, f64::powf),
        "atan" => binary(stack, |num, den| {
            let deg = num.atan2(den).to_degrees();
            if deg < 0.0 { deg + 360.0 } else { deg }
        }),
        "bitshift" => binary(stack, |a, shift| {
            let (a, shift) = (a as i64, shift as i64);
            if shift >= 0 {
                (a << shift.min(63)) as f64
            } else {
                (a >> (-shift).min(63)) as f64
            }
        }),
        "eq" | "ne" => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            let equal = a == b;
            stack.push(Bool(if name == "eq" { equal } else { !equal }));
            Some(())
        }
        "gt" => compare(stack, |a, b| a > b),
        "ge" => compare(stack, |a, b| a >= b),
        "lt" => compare(stack, |a, b| a < b),
        "le" => compare(stack, |a, b| a <= b),
        "and" | "or" | "xor" => {
            let b = stack.pop()?;
            let a = stack.pop()?;
            let value = match (a, b) {
                (Bool(x), Bool(y)) => Bool(match name {
                    "and" => x && y,
                    "or" => x || y,
                    _ => x ^ y,
                }),
                (Num(x), Num(y)) => {
                    let (x, y) = (x as i64, y as i64);
                    Num(match name {
                        "and" => x & y,
                        "or" => x | y,
                        _ => x ^ y,
                    } as f64)
                }
                _ => return None,
            };
            stack.push(value);
            Some(())
        }
        "not" => {
            let value = match stack.pop()? {
                Bool(b) => Bool(!b),
                Num(n) => Num(!(n as i64) as f64),
            };
            stack.push(value);
            Some(())
        }
        "pop" => stack.pop().map(|_| ()),
        "dup" => {
            let top = *stack.last()?;
            stack.push(top);
            Some(())
        }
        "exch" => {
            let len = stack.len();
            if len < 2 {
                return None;
            }
            stack.swap(len - 1, len - 2);
            Some(())
        }
        "copy" => {
            let n = pop_num(stack)? as usize;
            let len = stack.len();
            if n > len {
                return None;
            }
            stack.extend_from_within(len - n..);
            Some(())
        }
        "index" => {
            let n = pop_num(stack)? as usize;
            let len = stack.len();
            if n >= len {
                return None;
            }
            stack.push(stack[len - 1 - n]);
            Some(())
        }
        "roll" => {
            let j = pop_num(stack)? as i64;
            let n = pop_num(stack)? as usize;
            let len = stack.len();
            if n > len {
                return None;
            }
            if n > 0 {
                let window = &mut stack[len - n..];
                let shift = j.rem_euclid(n as i64) as usize;
                window.rotate_right(shift);
            }
            Some(())
        }
        _ => None,
    }
}
