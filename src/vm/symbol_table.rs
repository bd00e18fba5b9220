//! Lexical symbol table with transitive free-variable promotion.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Global,
    Local,
    Builtin,
    Free,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: Scope,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: HashMap<String, Symbol>,
    num_definitions: usize,
    pub free_symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new nested scope, taking ownership of the enclosing table.
    pub fn push(outer: SymbolTable) -> Self {
        Self {
            outer: Some(Box::new(outer)),
            ..Self::default()
        }
    }

    /// Pop back to the enclosing scope, discarding this one.
    pub fn pop(self) -> SymbolTable {
        *self.outer.expect("pop called on outermost symbol table")
    }

    pub fn is_global(&self) -> bool {
        self.outer.is_none()
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.is_global() { Scope::Global } else { Scope::Local };
        let symbol = Symbol {
            name: name.to_string(),
            scope,
            index: self.num_definitions,
        };
        self.num_definitions += 1;
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: Scope::Builtin,
            index,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol {
            name: name.to_string(),
            scope: Scope::Function,
            index: 0,
        };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        let index = self.free_symbols.len();
        self.free_symbols.push(original.clone());
        let symbol = Symbol {
            name: original.name.clone(),
            scope: Scope::Free,
            index,
        };
        self.store.insert(original.name, symbol.clone());
        symbol
    }

    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }
        let outer = self.outer.as_mut()?;
        let resolved = outer.resolve(name)?;
        match resolved.scope {
            Scope::Global | Scope::Builtin => Some(resolved),
            _ => Some(self.define_free(resolved)),
        }
    }

    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_assigns_global_scope_at_top_level() {
        let mut table = SymbolTable::new();
        let a = table.define("a");
        let b = table.define("b");
        assert_eq!(a, Symbol { name: "a".into(), scope: Scope::Global, index: 0 });
        assert_eq!(b, Symbol { name: "b".into(), scope: Scope::Global, index: 1 });
    }

    #[test]
    fn nested_scope_resolves_locals_before_outer() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut local = SymbolTable::push(global);
        let b = local.define("b");
        assert_eq!(local.resolve("b"), Some(b));
        assert_eq!(
            local.resolve("a"),
            Some(Symbol { name: "a".into(), scope: Scope::Global, index: 0 })
        );
    }

    #[test]
    fn resolve_promotes_outer_locals_to_free() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut first = SymbolTable::push(global);
        first.define("b");
        let mut second = SymbolTable::push(first);
        second.define("c");

        let resolved = second.resolve("b").expect("b resolves");
        assert_eq!(resolved.scope, Scope::Free);
        assert_eq!(resolved.index, 0);
        assert_eq!(second.free_symbols[0].name, "b");
        assert_eq!(second.free_symbols[0].scope, Scope::Local);
    }

    #[test]
    fn builtins_and_globals_pass_through_free_promotion() {
        let mut global = SymbolTable::new();
        global.define_builtin(0, "len");
        let mut local = SymbolTable::push(global);
        let resolved = local.resolve("len").expect("len resolves");
        assert_eq!(resolved.scope, Scope::Builtin);
        assert!(local.free_symbols.is_empty());
    }
}
