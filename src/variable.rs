//! Identification of variables and coupled inputs.
use crate::fields::FieldAccessor;
use crate::nalgebra::allocator::Allocator;
use crate::nalgebra::{DefaultAllocator, DimName};
use crate::Real;
use eyre::eyre;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Opaque identifier of a variable in the system being assembled.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct VariableId(pub usize);

/// Maps variable names to identifiers.
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    names: Vec<String>,
    ids: FxHashMap<String, VariableId>,
}

impl VariableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable and returns its identifier.
    ///
    /// Registering a name twice returns the identifier given the first time.
    pub fn register(&mut self, name: impl Into<String>) -> VariableId {
        let name = name.into();
        if let Some(&id) = self.ids.get(&name) {
            return id;
        }
        let id = VariableId(self.names.len());
        self.names.push(name.clone());
        self.ids.insert(name, id);
        id
    }

    pub fn id(&self, name: &str) -> Option<VariableId> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: VariableId) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Same as [`id`](Self::id), but unknown names are an error.
    pub fn lookup(&self, name: &str) -> eyre::Result<VariableId> {
        self.id(name)
            .ok_or_else(|| eyre!("unknown variable \"{}\"", name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A coupled kernel input: either another variable or a constant value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Coupled<T> {
    Variable(VariableId),
    Constant(T),
}

impl<T: Real> Coupled<T> {
    /// The coupling used for optional inputs that were not given, such as volume fractions.
    pub fn one() -> Self {
        Coupled::Constant(T::one())
    }

    pub fn zero() -> Self {
        Coupled::Constant(T::zero())
    }

    /// Value of the input at the given quadrature point.
    pub fn value<D>(&self, fields: &(impl FieldAccessor<T, D> + ?Sized), qp: usize) -> T
    where
        D: DimName,
        DefaultAllocator: Allocator<T, D>,
    {
        match self {
            Coupled::Variable(id) => fields.coupled(*id, qp),
            Coupled::Constant(value) => *value,
        }
    }

    /// Whether the input is the variable `jvar`. Constants never match.
    pub fn is(&self, jvar: VariableId) -> bool {
        matches!(self, Coupled::Variable(id) if *id == jvar)
    }

    pub fn variable(&self) -> Option<VariableId> {
        match self {
            Coupled::Variable(id) => Some(*id),
            Coupled::Constant(_) => None,
        }
    }
}

impl<T> From<VariableId> for Coupled<T> {
    fn from(id: VariableId) -> Self {
        Coupled::Variable(id)
    }
}
