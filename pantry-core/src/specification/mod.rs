//! Composable query predicates.
//!
//! A [`Specification`] answers the same question two ways: as an in-memory
//! test over an entity, and as a SQL `WHERE` fragment the repositories run
//! against storage. Both modes of every concrete specification select the
//! same entities.
//!
//! ```ignore
//! let spec = FoodByCategorySpecification::new(FoodCategory::Dairy)
//!     .and(&MinMacronutrientSpecification::new(MacronutrientField::Protein, 10.0));
//! let foods = food_repo.find(&spec).await?;
//! ```

mod food;
mod fragment;
mod pantry_item;

pub use food::{
    FoodByBarcodeSpecification, FoodByBrandSpecification, FoodByCategorySpecification,
    FoodByIdSpecification, FoodByStateSpecification, FoodNameContainsSpecification,
    MacronutrientField, MaxMacronutrientSpecification, MinMacronutrientSpecification,
};
pub use fragment::QueryFragment;
pub use pantry_item::{
    EmptySpecification, ExpiredSpecification, ExpiringSoonSpecification,
    LowQuantitySpecification, NotExpiredSpecification, PantryItemByFoodIdSpecification,
    PantryItemByIdSpecification, PantryItemByLocationSpecification, SafetyCriticalSpecification,
};

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

pub trait Specification<T>: Send + Sync {
    fn is_satisfied_by(&self, candidate: &T) -> bool;

    fn to_query_fragment(&self) -> QueryFragment;
}

/// Shared handle to any specification over `T`.
pub struct Spec<T>(Arc<dyn Specification<T>>);

impl<T> Spec<T> {
    pub fn new<S>(spec: S) -> Self
    where
        S: Specification<T> + 'static,
    {
        Spec(Arc::new(spec))
    }
}

impl<T> Clone for Spec<T> {
    fn clone(&self) -> Self {
        Spec(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Spec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Spec")
            .field(&self.0.to_query_fragment().sql)
            .finish()
    }
}

impl<T> Specification<T> for Spec<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.0.is_satisfied_by(candidate)
    }

    fn to_query_fragment(&self) -> QueryFragment {
        self.0.to_query_fragment()
    }
}

/// `and` / `or` / `not` for every cloneable specification. Operands are
/// cloned into the composite and left untouched.
pub trait SpecificationExt<T: 'static>: Specification<T> + Clone + Sized + 'static {
    fn boxed(&self) -> Spec<T> {
        Spec::new(self.clone())
    }

    fn and<O: SpecificationExt<T>>(&self, other: &O) -> Spec<T> {
        Spec::new(AndSpecification {
            left: self.boxed(),
            right: other.boxed(),
        })
    }

    fn or<O: SpecificationExt<T>>(&self, other: &O) -> Spec<T> {
        Spec::new(OrSpecification {
            left: self.boxed(),
            right: other.boxed(),
        })
    }

    fn not(&self) -> Spec<T> {
        Spec::new(NotSpecification {
            inner: self.boxed(),
        })
    }
}

impl<T: 'static, S> SpecificationExt<T> for S where S: Specification<T> + Clone + 'static {}

pub struct AndSpecification<T> {
    left: Spec<T>,
    right: Spec<T>,
}

impl<T> Specification<T> for AndSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) && self.right.is_satisfied_by(candidate)
    }

    fn to_query_fragment(&self) -> QueryFragment {
        self.left
            .to_query_fragment()
            .and(self.right.to_query_fragment())
    }
}

pub struct OrSpecification<T> {
    left: Spec<T>,
    right: Spec<T>,
}

impl<T> Specification<T> for OrSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        self.left.is_satisfied_by(candidate) || self.right.is_satisfied_by(candidate)
    }

    fn to_query_fragment(&self) -> QueryFragment {
        self.left
            .to_query_fragment()
            .or(self.right.to_query_fragment())
    }
}

pub struct NotSpecification<T> {
    inner: Spec<T>,
}

impl<T> Specification<T> for NotSpecification<T> {
    fn is_satisfied_by(&self, candidate: &T) -> bool {
        !self.inner.is_satisfied_by(candidate)
    }

    fn to_query_fragment(&self) -> QueryFragment {
        self.inner.to_query_fragment().not()
    }
}

/// Matches everything.
pub struct TrueSpecification<T>(PhantomData<fn(&T)>);

impl<T> TrueSpecification<T> {
    pub fn new() -> Self {
        TrueSpecification(PhantomData)
    }
}

impl<T> Default for TrueSpecification<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for TrueSpecification<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> Specification<T> for TrueSpecification<T> {
    fn is_satisfied_by(&self, _candidate: &T) -> bool {
        true
    }

    fn to_query_fragment(&self) -> QueryFragment {
        QueryFragment::new("1 = 1")
    }
}
