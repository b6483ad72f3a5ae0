//! Scope tree: lexical name lookup for locals, parameters and aliases.
//!
//! All scopes of a compilation unit live in one arena; cross-references are
//! [`ScopeId`] indices, never owning pointers, so a node's enclosing-scope
//! reference can be a plain `Copy` value. Alias resolution is guarded
//! against cycles: an alias chain that revisits a name short-circuits with
//! [`NameResolution::CyclicAlias`] instead of looping.

use rustc_hash::FxHashMap;

use ilex_core::{DataType, Span, TypeHash};

/// Index of a scope in the [`ScopeTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// A local variable or parameter.
#[derive(Debug, Clone)]
pub struct LocalVar {
    /// Name.
    pub name: String,
    /// Declared type.
    pub ty: DataType,
    /// Whether this is a method parameter rather than a local.
    pub is_parameter: bool,
    /// Slot index within the declaring scope, in declaration order.
    pub index: u32,
    /// Declaration site.
    pub span: Span,
}

/// A using-alias: a name that stands for another name in the same scope
/// chain.
#[derive(Debug, Clone)]
pub struct AliasDef {
    /// The alias name.
    pub name: String,
    /// The name the alias expands to.
    pub target: String,
    /// Declaration site.
    pub span: Span,
}

/// One lexical scope.
#[derive(Debug, Default)]
pub struct Scope {
    parent: Option<ScopeId>,
    locals: FxHashMap<String, LocalVar>,
    aliases: FxHashMap<String, AliasDef>,
    /// The enclosing type, for `this`/implicit-member resolution.
    pub this_type: Option<TypeHash>,
    /// Set when the scope is the body of a constructor of the given type;
    /// readonly fields of that type are assignable here.
    pub constructor_of: Option<TypeHash>,
}

/// Result of resolving a simple name against the scope chain.
#[derive(Debug, Clone)]
pub enum NameResolution {
    /// A local variable or parameter, with the scope that declared it.
    Local(ScopeId, LocalVar),
    /// The name resolved through aliases to another simple name that then
    /// found nothing in the scope chain; member/type lookup should continue
    /// with this expanded name.
    Expanded(String),
    /// An alias chain revisited a name.
    CyclicAlias(Span),
    /// Nothing in the scope chain knows this name.
    NotFound,
}

/// Arena of scopes for one compilation unit.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeTree {
    /// A tree holding just the root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// The root scope. Every tree has exactly one.
    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Create a child scope of `parent`.
    pub fn child(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            ..Scope::default()
        });
        let id = ScopeId(self.scopes.len() as u32 - 1);
        // Inherit the enclosing type context.
        let (this_type, constructor_of) = {
            let p = self.get(parent);
            (p.this_type, p.constructor_of)
        };
        let s = self.get_mut(id);
        s.this_type = this_type;
        s.constructor_of = constructor_of;
        id
    }

    /// Borrow a scope.
    pub fn get(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Mutably borrow a scope.
    pub fn get_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0 as usize]
    }

    /// Declare a local variable in a scope.
    pub fn declare_local(&mut self, scope: ScopeId, name: impl Into<String>, ty: DataType) {
        let name = name.into();
        let s = self.get_mut(scope);
        let index = s.locals.len() as u32;
        s.locals.insert(
            name.clone(),
            LocalVar {
                name,
                ty,
                is_parameter: false,
                index,
                span: Span::default(),
            },
        );
    }

    /// Declare a parameter in a scope.
    pub fn declare_param(&mut self, scope: ScopeId, name: impl Into<String>, ty: DataType) {
        let name = name.into();
        let s = self.get_mut(scope);
        let index = s.locals.len() as u32;
        s.locals.insert(
            name.clone(),
            LocalVar {
                name,
                ty,
                is_parameter: true,
                index,
                span: Span::default(),
            },
        );
    }

    /// Declare a using-alias in a scope.
    pub fn declare_alias(
        &mut self,
        scope: ScopeId,
        name: impl Into<String>,
        target: impl Into<String>,
        span: Span,
    ) {
        let name = name.into();
        self.get_mut(scope).aliases.insert(
            name.clone(),
            AliasDef {
                name,
                target: target.into(),
                span,
            },
        );
    }

    /// Resolve a simple name against the scope chain starting at `scope`.
    ///
    /// Locals and parameters win over aliases. Alias expansion restarts the
    /// lookup with the target name; a chain that revisits a name is cyclic.
    pub fn resolve_name(&self, scope: ScopeId, name: &str) -> NameResolution {
        let mut visited: Vec<&str> = Vec::new();
        let mut current_name = name;
        loop {
            let mut cursor = Some(scope);
            let mut alias: Option<&AliasDef> = None;
            while let Some(id) = cursor {
                let s = self.get(id);
                if let Some(local) = s.locals.get(current_name) {
                    return NameResolution::Local(id, local.clone());
                }
                if alias.is_none() {
                    alias = s.aliases.get(current_name);
                }
                cursor = s.parent;
            }
            match alias {
                Some(def) => {
                    if visited.contains(&current_name) {
                        return NameResolution::CyclicAlias(def.span);
                    }
                    visited.push(current_name);
                    if visited.contains(&def.target.as_str()) {
                        return NameResolution::CyclicAlias(def.span);
                    }
                    // Restart the walk with the expanded name. The borrow is
                    // only of the target string, so clone-free restarting
                    // needs the loop structure above.
                    current_name = def.target.as_str();
                }
                None => {
                    if visited.is_empty() {
                        return NameResolution::NotFound;
                    }
                    return NameResolution::Expanded(current_name.to_string());
                }
            }
        }
    }
}
