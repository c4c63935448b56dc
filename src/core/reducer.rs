//! Data reducers and entry-effect templates.

use super::fault::{self, PolicyFault};
use std::fmt;
use std::sync::Arc;

type ReduceFn<A, D> = dyn Fn(&A, &D) -> Result<Option<D>, PolicyFault> + Send + Sync;
type CreateFn<D, E> = dyn Fn(&D) -> E + Send + Sync;

/// Pure data update `(Action, Data) -> Option<Data>`.
///
/// `None` means the action leaves the data untouched and no data event is
/// published.
///
/// # Example
///
/// ```rust
/// use reactive_fsm::core::Reducer;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Tally {
///     count: i64,
/// }
///
/// let add = Reducer::new(|delta: &i64, tally: &Tally| {
///     (*delta != 0).then(|| Tally { count: tally.count + delta })
/// });
///
/// assert_eq!(add.reduce(&2, &Tally { count: 1 }), Ok(Some(Tally { count: 3 })));
/// assert_eq!(add.reduce(&0, &Tally { count: 1 }), Ok(None));
/// ```
pub struct Reducer<A, D> {
    reduce: Arc<ReduceFn<A, D>>,
}

impl<A, D> Reducer<A, D> {
    pub fn new<F>(reduce: F) -> Self
    where
        F: Fn(&A, &D) -> Option<D> + Send + Sync + 'static,
    {
        Self {
            reduce: Arc::new(move |action, data| Ok(reduce(action, data))),
        }
    }

    /// Create a reducer that may fail; a fault terminates the engine run.
    pub fn try_new<F>(reduce: F) -> Self
    where
        F: Fn(&A, &D) -> Result<Option<D>, PolicyFault> + Send + Sync + 'static,
    {
        Self {
            reduce: Arc::new(reduce),
        }
    }

    pub fn reduce(&self, action: &A, data: &D) -> Result<Option<D>, PolicyFault> {
        fault::contain(|| (self.reduce)(action, data))
    }
}

impl<A, D> Clone for Reducer<A, D> {
    fn clone(&self) -> Self {
        Self {
            reduce: Arc::clone(&self.reduce),
        }
    }
}

impl<A, D> fmt::Debug for Reducer<A, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reducer(..)")
    }
}

/// Builds the effect descriptor for a state from the data current at entry.
///
/// The engine never looks inside the descriptor; it hands it to
/// [`Machine::execute`](crate::engine::Machine::execute).
pub struct EffectTemplate<D, E> {
    create: Arc<CreateFn<D, E>>,
}

impl<D, E> EffectTemplate<D, E> {
    pub fn new<F>(create: F) -> Self
    where
        F: Fn(&D) -> E + Send + Sync + 'static,
    {
        Self {
            create: Arc::new(create),
        }
    }

    pub fn create(&self, data: &D) -> E {
        (self.create)(data)
    }
}

impl<D, E> Clone for EffectTemplate<D, E> {
    fn clone(&self) -> Self {
        Self {
            create: Arc::clone(&self.create),
        }
    }
}

impl<D, E> fmt::Debug for EffectTemplate<D, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EffectTemplate(..)")
    }
}
