use std::fmt;
use std::sync::Arc;

use super::error::HandlerError;
use super::types::OneOrMany;

type CallbackFn<P> = dyn Fn(Option<&P>) -> Result<(), HandlerError> + Send + Sync;

/// A subscribed function, compared by identity
///
/// Two `Callback`s are the same subscriber only if one was cloned from the
/// other. Wrapping the same closure twice produces two different callbacks,
/// so keep the handle returned by [`Callback::new`] around if you intend to
/// unsubscribe it later.
pub struct Callback<P> {
    inner: Arc<CallbackFn<P>>,
}

impl<P> Callback<P> {
    /// Wraps a fallible function. An `Err` is handled according to the
    /// registry's failure policy.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&P>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Wraps a function that cannot fail
    pub fn infallible<F>(f: F) -> Self
    where
        F: Fn(Option<&P>) + Send + Sync + 'static,
    {
        Self::new(move |data| {
            f(data);
            Ok(())
        })
    }

    pub fn call(&self, data: Option<&P>) -> Result<(), HandlerError> {
        (self.inner)(data)
    }

    /// Identity comparison: true when both handles share one allocation
    pub fn same_as(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P> Clone for Callback<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> PartialEq for Callback<P> {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl<P> Eq for Callback<P> {}

impl<P> fmt::Debug for Callback<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

impl<P> From<Callback<P>> for OneOrMany<Callback<P>> {
    fn from(callback: Callback<P>) -> Self {
        OneOrMany::One(callback)
    }
}

impl<P> From<&Callback<P>> for OneOrMany<Callback<P>> {
    fn from(callback: &Callback<P>) -> Self {
        OneOrMany::One(callback.clone())
    }
}

impl<P> From<Vec<Callback<P>>> for OneOrMany<Callback<P>> {
    fn from(callbacks: Vec<Callback<P>>) -> Self {
        OneOrMany::Many(callbacks)
    }
}

impl<P> From<&[Callback<P>]> for OneOrMany<Callback<P>> {
    fn from(callbacks: &[Callback<P>]) -> Self {
        OneOrMany::Many(callbacks.to_vec())
    }
}

impl<P, const N: usize> From<[Callback<P>; N]> for OneOrMany<Callback<P>> {
    fn from(callbacks: [Callback<P>; N]) -> Self {
        OneOrMany::Many(callbacks.into())
    }
}
