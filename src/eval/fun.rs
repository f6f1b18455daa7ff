use std::cell::RefCell;
use std::collections::HashMap;
use std::error;
use std::rc::Rc;

use regex::Regex;
use tracing::debug;

use crate::{QueryError, Value};

/// Errors raised inside registered functions, wrapped by the evaluator into
/// a "Function execution failed" diagnostic.
pub type FunError = Box<dyn error::Error + Send + Sync>;

pub type Callable = Rc<dyn Fn(&[Value]) -> Result<Value, FunError>>;

/// Maps function names to callables. Each name maps to exactly one callable,
/// registering an existing name replaces it.
pub struct Registry {
    funs: HashMap<String, Callable>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut registry = Self {
            funs: HashMap::new(),
        };
        registry.insert_builtins();
        registry
    }
}

impl Registry {
    pub fn register<F>(&mut self, name: &str, fun: F) -> Result<(), QueryError>
    where
        F: Fn(&[Value]) -> Result<Value, FunError> + 'static,
    {
        if name.trim().is_empty() {
            return Err(QueryError::Argument(
                "Function name must not be empty".into(),
            ));
        }
        debug!("registered function: {name}");
        self.insert(name, fun);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Callable> {
        self.funs.get(name).cloned()
    }

    fn insert<F>(&mut self, name: &str, fun: F)
    where
        F: Fn(&[Value]) -> Result<Value, FunError> + 'static,
    {
        self.funs.insert(name.to_string(), Rc::new(fun));
    }

    fn insert_builtins(&mut self) {
        // compiled patterns are shared across calls but stay local to this
        // registry and with it to its evaluator
        let patterns: RefCell<HashMap<String, Regex>> = RefCell::new(HashMap::new());
        self.insert("replace", move |args| {
            if args.len() != 3 {
                return Err("replace requires 3 arguments: string, target, replacement".into());
            }
            if args.iter().any(|a| a.is_null()) {
                return Ok(Value::Null);
            }
            let s = str_val("replace", &args[0])?;
            let target = str_val("replace", &args[1])?;
            let replacement = str_val("replace", &args[2])?;

            let mut patterns = patterns.borrow_mut();
            if !patterns.contains_key(target) {
                let re = Regex::new(target)
                    .map_err(|e| format!("invalid replace pattern '{target}': {e}"))?;
                patterns.insert(target.to_string(), re);
            }
            let re = &patterns[target];
            Ok(Value::Str(re.replace_all(s, replacement).into_owned()))
        });

        self.insert("upper", |args| {
            if args.len() != 1 {
                return Err("upper requires 1 argument: string".into());
            }
            if args[0].is_null() {
                return Ok(Value::Null);
            }
            Ok(Value::Str(str_val("upper", &args[0])?.to_ascii_uppercase()))
        });
        self.insert("lower", |args| {
            if args.len() != 1 {
                return Err("lower requires 1 argument: string".into());
            }
            if args[0].is_null() {
                return Ok(Value::Null);
            }
            Ok(Value::Str(str_val("lower", &args[0])?.to_ascii_lowercase()))
        });
        self.insert("substring", substring);
        self.insert("concat", concat);
        self.insert("length", length);

        self.insert("min", |args| min_max("min", args, f64::min));
        self.insert("max", |args| min_max("max", args, f64::max));
        self.insert("abs", |args| math1("abs", args, f64::abs));
        self.insert("round", |args| math1("round", args, f64::round));
        self.insert("ceil", |args| math1("ceil", args, f64::ceil));
        self.insert("floor", |args| math1("floor", args, f64::floor));
        self.insert("sqrt", |args| math1("sqrt", args, f64::sqrt));

        self.insert("contains", |args| {
            text_test("contains", args, |s, t| s.contains(t))
        });
        self.insert("startsWith", |args| {
            text_test("startsWith", args, |s, t| s.starts_with(t))
        });
        self.insert("endsWith", |args| {
            text_test("endsWith", args, |s, t| s.ends_with(t))
        });
    }
}

fn str_val<'a>(name: &str, val: &'a Value) -> Result<&'a str, FunError> {
    match val.as_str() {
        Some(s) => Ok(s),
        None => Err(format!(
            "{name} requires string arguments, found '{val}' of type {}",
            val.type_name()
        )
        .into()),
    }
}

fn num_val(name: &str, val: &Value) -> Result<f64, FunError> {
    match val.to_f64() {
        Some(n) => Ok(n),
        None => Err(format!(
            "{name} requires numeric arguments, found '{val}' of type {}",
            val.type_name()
        )
        .into()),
    }
}

fn substring(args: &[Value]) -> Result<Value, FunError> {
    if !(2..=3).contains(&args.len()) {
        return Err("substring requires 2 or 3 arguments: string, start, [end]".into());
    }
    if args[0].is_null() || args[1].is_null() {
        return Ok(Value::Null);
    }
    let s = str_val("substring", &args[0])?;
    let len = s.chars().count() as i64;
    let start = num_val("substring", &args[1])? as i64;
    let end = match args.get(2) {
        Some(v) if !v.is_null() => num_val("substring", v)? as i64,
        _ => len,
    };
    let end = end.min(len);

    if start < 0 || start > end {
        return Err(format!(
            "substring range {start}..{end} is out of bounds for a string of length {len}"
        )
        .into());
    }

    let sub: String = s
        .chars()
        .skip(start as usize)
        .take((end - start) as usize)
        .collect();
    Ok(Value::Str(sub))
}

fn concat(args: &[Value]) -> Result<Value, FunError> {
    if args.is_empty() {
        return Err("concat requires at least 1 argument: strings".into());
    }
    let mut out = String::new();
    for a in args {
        if !a.is_null() {
            out.push_str(&a.to_string());
        }
    }
    Ok(Value::Str(out))
}

fn length(args: &[Value]) -> Result<Value, FunError> {
    if args.len() != 1 {
        return Err("length requires 1 argument: string or list".into());
    }
    match &args[0] {
        Value::Null => Ok(Value::Null),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        Value::List(l) => Ok(Value::Int(l.len() as i64)),
        _ => Ok(Value::Int(0)),
    }
}

fn min_max(name: &str, args: &[Value], pick: fn(f64, f64) -> f64) -> Result<Value, FunError> {
    if args.is_empty() {
        return Err(format!("{name} requires at least 1 argument: numbers").into());
    }
    let mut best: Option<f64> = None;
    for a in args {
        if a.is_null() {
            continue;
        }
        let n = num_val(name, a)?;
        best = Some(match best {
            Some(b) => pick(b, n),
            None => n,
        });
    }
    match best {
        Some(b) => Ok(Value::Float(b)),
        None => Err(format!("No valid numbers provided to {name}").into()),
    }
}

fn math1(name: &str, args: &[Value], op: fn(f64) -> f64) -> Result<Value, FunError> {
    if args.len() != 1 {
        return Err(format!("{name} requires 1 argument: number").into());
    }
    if args[0].is_null() {
        return Ok(Value::Null);
    }
    Ok(Value::Float(op(num_val(name, &args[0])?)))
}

fn text_test(
    name: &str,
    args: &[Value],
    test: fn(&str, &str) -> bool,
) -> Result<Value, FunError> {
    if !(2..=3).contains(&args.len()) {
        return Err(format!("{name} requires 2 or 3 arguments: string, string, [ignore case]").into());
    }
    if args[0].is_null() || args[1].is_null() {
        return Ok(Value::Bool(false));
    }
    let s = str_val(name, &args[0])?;
    let t = str_val(name, &args[1])?;

    let ignore_case = match args.get(2) {
        Some(v) if !v.is_null() => match v.as_bool() {
            Some(b) => b,
            None => {
                return Err(format!(
                    "{name} ignore case flag must be a bool, found '{v}' of type {}",
                    v.type_name()
                )
                .into())
            }
        },
        _ => false,
    };

    let matches = if ignore_case {
        test(&s.to_ascii_lowercase(), &t.to_ascii_lowercase())
    } else {
        test(s, t)
    };
    Ok(Value::Bool(matches))
}
