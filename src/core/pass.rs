// This module defines the Pass trait and the Pipeline that sequences passes. A pass is a
// named transformation that consumes one DAG value by move and returns either the
// transformed value or a Diagnostic. A Pipeline owns an ordered list of same-typed
// passes, runs them strictly in order, and stops at the first failure, returning that
// Diagnostic untouched so later passes never run. Then composes two passes with
// different input/output types into one, which is how validation, normalization and
// instruction selection are chained into a single IR-to-target pass.

//! Passes and pipelines.

use std::marker::PhantomData;

use super::error::PassResult;

/// A named DAG-to-DAG transformation.
pub trait Pass<In, Out> {
    /// Human-readable name used in diagnostics.
    fn name(&self) -> String;

    fn transform(&self, input: In) -> PassResult<Out>;
}

/// A pass that keeps the value type.
pub type Transformer<T> = dyn Pass<T, T>;

/// Boxed same-type pass, as stored by [`Pipeline`].
pub type TransformerRef<T> = Box<Transformer<T>>;

/// Ordered, short-circuiting sequence of passes.
pub struct Pipeline<T> {
    passes: Vec<TransformerRef<T>>,
}

impl<T> Pipeline<T> {
    pub fn new(passes: Vec<TransformerRef<T>>) -> Self {
        Self { passes }
    }

    /// Append a pass to the end of the pipeline.
    pub fn push(&mut self, pass: impl Pass<T, T> + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl<T> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T> Pass<T, T> for Pipeline<T> {
    fn name(&self) -> String {
        let names: Vec<String> = self.passes.iter().map(|p| p.name()).collect();
        format!("pipeline({})", names.join(", "))
    }

    fn transform(&self, input: T) -> PassResult<T> {
        let mut value = input;
        for pass in &self.passes {
            log::debug!("running pass {}", pass.name());
            value = pass.transform(value)?;
        }
        Ok(value)
    }
}

/// Runs `first`, then feeds its output to `second`.
///
/// `Mid` is the value type handed from one pass to the other.
pub struct Then<A, B, Mid> {
    first: A,
    second: B,
    _mid: PhantomData<fn() -> Mid>,
}

impl<A, B, Mid> Then<A, B, Mid> {
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            _mid: PhantomData,
        }
    }
}

impl<In, Mid, Out, A, B> Pass<In, Out> for Then<A, B, Mid>
where
    A: Pass<In, Mid>,
    B: Pass<Mid, Out>,
{
    fn name(&self) -> String {
        format!("{} -> {}", self.first.name(), self.second.name())
    }

    fn transform(&self, input: In) -> PassResult<Out> {
        let mid = self.first.transform(input)?;
        self.second.transform(mid)
    }
}
