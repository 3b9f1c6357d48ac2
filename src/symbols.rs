use fnv::FnvHashMap;

/// Which VM memory segment a variable occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageClass {
    Static,
    Argument,
    Local,
}

/// Maps variable names to slot offsets within one scope. Offsets are dense:
/// the first name gets 0, the next 1, and so on.
#[derive(Default)]
pub struct SymbolTable {
    slots: FnvHashMap<String, u32>,
    next: u32,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name at the next offset. The caller must have checked for
    /// duplicates; re-adding a name is rejected here as a safeguard.
    pub fn add(&mut self, name: &str) -> Option<u32> {
        if self.slots.contains_key(name) {
            return None;
        }
        let offset = self.next;
        self.slots.insert(name.to_string(), offset);
        self.next += 1;
        Some(offset)
    }

    pub fn find(&self, name: &str) -> Option<u32> {
        self.slots.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> u32 {
        self.next
    }
}

/// The three scopes live at once while a function compiles: one static
/// table for the whole program, plus argument and local tables rebuilt for
/// each function definition.
pub struct Scopes {
    statics: SymbolTable,
    arguments: SymbolTable,
    locals: SymbolTable,
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            statics: SymbolTable::new(),
            arguments: SymbolTable::new(),
            locals: SymbolTable::new(),
        }
    }

    /// Discard the previous function's argument and local tables.
    pub fn begin_function(&mut self) {
        self.arguments = SymbolTable::new();
        self.locals = SymbolTable::new();
    }

    /// Declare a name in the given scope. Returns `None` if the name is
    /// taken: statics collide only with statics, while arguments and locals
    /// share the function scope and collide with each other. A function-
    /// scoped name may reuse a static's name and shadows it in lookups.
    pub fn define(&mut self, class: StorageClass, name: &str) -> Option<u32> {
        match class {
            StorageClass::Static => self.statics.add(name),
            StorageClass::Argument => {
                if self.locals.contains(name) {
                    return None;
                }
                self.arguments.add(name)
            }
            StorageClass::Local => {
                if self.arguments.contains(name) {
                    return None;
                }
                self.locals.add(name)
            }
        }
    }

    /// Probe the scope chain: locals, then arguments, then statics.
    pub fn resolve(&self, name: &str) -> Option<(StorageClass, u32)> {
        let chain = [
            (StorageClass::Local, &self.locals),
            (StorageClass::Argument, &self.arguments),
            (StorageClass::Static, &self.statics),
        ];
        chain
            .iter()
            .find_map(|(class, table)| table.find(name).map(|offset| (*class, offset)))
    }

    pub fn local_count(&self) -> u32 {
        self.locals.len()
    }
}
