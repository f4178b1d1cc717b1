use std::cell::RefCell;
use std::collections::HashSet;

use crate::plan::{Lambda, Parameter, ValueExpr};

/// Issues range variables for one compile call.
///
/// Names derive from the element type (`Article` -> `article`). A name is
/// handed out at most once per factory: later scopes over the same type get
/// a numeric suffix (`article2`, `article3`, ...), even after the earlier
/// scope has been released.
#[derive(Debug, Default)]
pub struct LambdaScopeFactory {
    issued: RefCell<HashSet<String>>,
    active: RefCell<Vec<String>>,
}

impl LambdaScopeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_scope(&self, element_type: &str) -> LambdaScope<'_> {
        let name = self.next_name(element_type);
        self.active.borrow_mut().push(name.clone());
        tracing::trace!(name = %name, element_type, depth = self.active.borrow().len(), "scope.create");
        LambdaScope {
            factory: self,
            parameter: Parameter { name, element_type: element_type.to_string() },
        }
    }

    /// Names bound by the scopes currently alive, outermost first.
    pub fn active_names(&self) -> Vec<String> {
        self.active.borrow().clone()
    }

    pub fn issued_count(&self) -> usize {
        self.issued.borrow().len()
    }

    fn next_name(&self, element_type: &str) -> String {
        let base = Self::camel_case(element_type);
        let mut issued = self.issued.borrow_mut();
        let mut name = base.clone();
        let mut counter = 1usize;
        while issued.contains(&name) {
            counter += 1;
            name = format!("{base}{counter}");
        }
        issued.insert(name.clone());
        name
    }

    fn camel_case(element_type: &str) -> String {
        let mut chars = element_type.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => "element".to_string(),
        }
    }

    fn release(&self, name: &str) {
        let mut active = self.active.borrow_mut();
        if let Some(position) = active.iter().rposition(|n| n == name) {
            active.remove(position);
        }
        tracing::trace!(name, depth = active.len(), "scope.release");
    }
}

/// A range variable bound for the dynamic extent of one clause builder call.
/// Dropping the scope releases it.
#[derive(Debug)]
pub struct LambdaScope<'f> {
    factory: &'f LambdaScopeFactory,
    parameter: Parameter,
}

impl LambdaScope<'_> {
    pub fn parameter(&self) -> &Parameter {
        &self.parameter
    }

    pub fn name(&self) -> &str {
        &self.parameter.name
    }

    pub fn element_type(&self) -> &str {
        &self.parameter.element_type
    }

    /// Expression denoting the current element.
    pub fn accessor(&self) -> ValueExpr {
        ValueExpr::Parameter(self.parameter.name.clone())
    }

    pub fn lambda(&self, body: ValueExpr) -> Lambda {
        Lambda::new(self.parameter.clone(), body)
    }
}

impl Drop for LambdaScope<'_> {
    fn drop(&mut self) {
        self.factory.release(&self.parameter.name);
    }
}
