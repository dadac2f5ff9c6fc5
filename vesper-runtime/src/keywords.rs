//! Keyword-argument canonicalization (the keyword sorter).
//!
//! A generic function `g` with a keyword-bearing method gets three
//! registrations:
//!
//! 1. a hidden canonical function `g#canonical` whose positional list is
//!    `K ++ [catch_all] ++ P` (keywords in declaration order, then the
//!    catch-all association, then the original positionals), carrying the
//!    original body;
//! 2. an ordinary positional method on `g` itself matching `P`, whose
//!    body evaluates every keyword default left-to-right and forwards;
//! 3. an entry on `g`'s keyword sorter, a secondary function dispatched
//!    through the same engine, whose signature is `[Assoc] ++ P` and
//!    whose body binds supplied keywords, fills in defaults, and routes
//!    unrecognized pairs to the catch-all.
//!
//! A call site with no keyword arguments dispatches through `g`'s own
//! table and never touches the sorter, so the keyword mechanism costs
//! keyword-free call sites nothing.
//!
//! Defaults are evaluated left-to-right over declared keyword order; each
//! default sees the keywords bound before it and all positional
//! arguments. A keyword without a default expression binds `Unit` when
//! unsupplied.

use std::sync::Arc;

use tracing::debug;

use crate::builtins;
use crate::error::DispatchError;
use crate::registry::Runtime;
use crate::types::TypeRef;
use crate::value::{KeywordName, MethodBody, Value};

/// One declared keyword parameter of a keyword-bearing method.
#[derive(Clone)]
pub struct KeywordSpec {
    pub name: KeywordName,
    /// Default expression, invoked with the keywords bound so far (in
    /// declaration order) followed by the positional arguments. `None`
    /// binds `Unit`.
    pub default: Option<MethodBody>,
}

impl KeywordSpec {
    pub fn new(name: KeywordName, default: Option<MethodBody>) -> Self {
        Self { name, default }
    }

    /// A keyword whose default is a fixed value.
    pub fn with_value(name: KeywordName, value: Value) -> Self {
        Self {
            name,
            default: Some(Arc::new(move |_, _| Ok(value.clone()))),
        }
    }
}

impl std::fmt::Debug for KeywordSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordSpec")
            .field("name", &self.name)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

/// One keyword argument at a call site, as produced by the front end's
/// lowering: either a literal `name = value` pair or a spliced value that
/// must itself decompose into name/value pairs.
#[derive(Debug, Clone)]
pub enum KeywordArg {
    Literal(KeywordName, Value),
    Splice(Value),
}

fn eval_default(
    rt: &Runtime,
    spec: &KeywordSpec,
    bound: &[Value],
    positionals: &[Value],
) -> Result<Value, DispatchError> {
    match &spec.default {
        Some(body) => {
            let mut scope = Vec::with_capacity(bound.len() + positionals.len());
            scope.extend_from_slice(bound);
            scope.extend_from_slice(positionals);
            body(rt, &scope)
        }
        None => Ok(Value::Unit),
    }
}

impl Runtime {
    /// Register a keyword-bearing method on `function`: positional
    /// pattern `positional`, declared keywords `keywords`, and the
    /// original body, which receives
    /// `(canonical, k_1..k_n, catch_all, p_1..p_m)`.
    pub fn define_keyword_method(
        &self,
        function: &Value,
        positional: Vec<TypeRef>,
        keywords: Vec<KeywordSpec>,
        body: MethodBody,
    ) {
        let fn_name = self.type_name(function.type_id());
        let specs = Arc::new(keywords);

        // 1. Hidden canonical method: K ++ [catch_all] ++ P.
        let canonical = self.define_function(&format!("{fn_name}#canonical"));
        let mut canon_params: Vec<TypeRef> =
            vec![builtins::ty(builtins::ANY); specs.len()];
        canon_params.push(builtins::ty(builtins::ASSOC));
        canon_params.extend(positional.iter().cloned());
        self.add_method(&canonical, canon_params, None, body);

        // 2. Ordinary positional method on the function itself: every
        // default evaluated left-to-right, empty catch-all.
        {
            let canonical = canonical.clone();
            let specs = specs.clone();
            self.add_method(
                function,
                positional.clone(),
                None,
                Arc::new(move |rt, argv| {
                    let positionals = &argv[1..];
                    let mut bound: Vec<Value> = Vec::with_capacity(specs.len());
                    for spec in specs.iter() {
                        let value = eval_default(rt, spec, &bound, positionals)?;
                        bound.push(value);
                    }
                    let mut forwarded = bound;
                    forwarded.push(Value::empty_assoc());
                    forwarded.extend_from_slice(positionals);
                    rt.call(&canonical, &forwarded)
                }),
            );
        }

        // 3. Sorter entry: [Assoc] ++ P.
        let sorter = self.keyword_sorter_for(function, &fn_name);
        let mut sorter_params = vec![builtins::ty(builtins::ASSOC)];
        sorter_params.extend(positional);
        self.add_method(
            &sorter,
            sorter_params,
            None,
            Arc::new(move |rt, argv| {
                // Pattern position 1 guarantees an association here.
                let Some(assoc) = argv[1].as_assoc() else {
                    return Err(DispatchError::MalformedKeyword {
                        detail: "sorter invoked without an association".into(),
                    });
                };
                let positionals = &argv[2..];

                let mut bound: Vec<Value> = Vec::with_capacity(specs.len());
                for spec in specs.iter() {
                    let value = match assoc.get(spec.name) {
                        Some(supplied) => supplied.clone(),
                        None => eval_default(rt, spec, &bound, positionals)?,
                    };
                    bound.push(value);
                }

                let leftover: Vec<(KeywordName, Value)> = assoc
                    .pairs()
                    .iter()
                    .filter(|(name, _)| specs.iter().all(|s| s.name != *name))
                    .cloned()
                    .collect();

                let mut forwarded = bound;
                forwarded.push(Value::assoc(leftover));
                forwarded.extend_from_slice(positionals);
                rt.call(&canonical, &forwarded)
            }),
        );

        debug!(function = %fn_name, "registered keyword-bearing method");
    }

    /// Dispatch a call site that supplies keyword arguments: build the
    /// association from the literal and spliced parts, then invoke the
    /// function's keyword sorter.
    ///
    /// Fails with [`DispatchError::MalformedKeyword`], before any
    /// default is evaluated, if a spliced element does not decompose
    /// into name/value pairs.
    pub fn keyword_call(
        &self,
        function: &Value,
        kw_args: &[KeywordArg],
        positionals: &[Value],
    ) -> Result<Value, DispatchError> {
        let mut pairs: Vec<(KeywordName, Value)> = Vec::with_capacity(kw_args.len());
        for arg in kw_args {
            match arg {
                KeywordArg::Literal(name, value) => pairs.push((*name, value.clone())),
                KeywordArg::Splice(value) => self.splice_into(value, &mut pairs)?,
            }
        }

        let fn_name = self.type_name(function.type_id());
        let sorter = self.keyword_sorter_for(function, &fn_name);

        let mut argv = Vec::with_capacity(positionals.len() + 1);
        argv.push(Value::assoc(pairs));
        argv.extend_from_slice(positionals);
        self.call(&sorter, &argv)
    }

    /// The function's keyword sorter, if one has been created. Read-only;
    /// used by diagnostics and tests.
    pub fn keyword_sorter(&self, function: &Value) -> Option<Value> {
        self.identity(function.type_id()).keyword_sorter.get().cloned()
    }

    fn keyword_sorter_for(&self, function: &Value, fn_name: &str) -> Value {
        self.identity(function.type_id())
            .keyword_sorter
            .get_or_init(|| self.define_function(&format!("{fn_name}#keywords")))
            .clone()
    }

    /// Decompose one spliced element into name/value pairs: an
    /// association contributes all its pairs, a two-element
    /// `(keyword, value)` tuple contributes one.
    fn splice_into(
        &self,
        value: &Value,
        pairs: &mut Vec<(KeywordName, Value)>,
    ) -> Result<(), DispatchError> {
        match value {
            Value::Assoc(assoc) => {
                pairs.extend(assoc.pairs().iter().cloned());
                Ok(())
            }
            Value::Tuple(items) => match items.as_ref() {
                [Value::Keyword(name), v] => {
                    pairs.push((*name, v.clone()));
                    Ok(())
                }
                _ => Err(DispatchError::MalformedKeyword {
                    detail: format!(
                        "spliced tuple of {} element(s) is not a (keyword, value) pair",
                        items.len()
                    ),
                }),
            },
            other => Err(DispatchError::MalformedKeyword {
                detail: format!(
                    "spliced value of type {} does not decompose into keyword pairs",
                    self.type_display(&other.type_ref())
                ),
            }),
        }
    }
}
