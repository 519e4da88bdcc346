//! Scope tree and identifier bindings produced by the structural parser
//!
//! Architecture: Arena-backed tree
//! - Scopes and bindings live in flat vectors owned by [`ScopeTree`]
//! - Parent links are [`ScopeId`] indices, never owning references
//! - A scope's id is always greater than its parent's, so the tree cannot cycle

use std::fmt;

use super::token::Position;

/// Index of a scope in its [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeId(usize);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a binding in its [`ScopeTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(usize);

impl BindingId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// Root of every tree
    File,
    Namespace,
    Type,
    Method,
    Block,
}

/// The kind of type that owns a member scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Record,
    Delegate,
}

impl TypeKind {
    /// Members declared without an access modifier are public in these types
    pub fn members_default_public(self) -> bool {
        matches!(self, Self::Interface | Self::Enum)
    }
}

/// The naming role a declaration plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    TypeName,
    InterfaceName,
    PublicMember,
    PrivateField,
    StaticField,
    ThreadStaticField,
    Parameter,
    LocalVariable,
    TypeParameter,
    Constant,
    PrivateMember,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TypeName => "type name",
            Self::InterfaceName => "interface name",
            Self::PublicMember => "public member",
            Self::PrivateField => "private field",
            Self::StaticField => "static field",
            Self::ThreadStaticField => "thread-static field",
            Self::Parameter => "parameter",
            Self::LocalVariable => "local variable",
            Self::TypeParameter => "type parameter",
            Self::Constant => "constant",
            Self::PrivateMember => "private member",
        }
    }

    /// Role of a member declared in a type body.
    ///
    /// Public-facing members are [`Role::PublicMember`] whatever their other
    /// modifiers. Constants are always [`Role::Constant`]. Non-public fields
    /// split by `[ThreadStatic]` then `static`; other non-public members are
    /// [`Role::PrivateMember`].
    pub fn for_member(kind: MemberKind, modifiers: &Modifiers, owner: TypeKind) -> Self {
        if modifiers.is_const {
            return Self::Constant;
        }
        let accessibility = modifiers.effective_accessibility(owner);
        if accessibility.is_public_facing() {
            return Self::PublicMember;
        }
        match kind {
            MemberKind::Field if modifiers.thread_static => Self::ThreadStaticField,
            MemberKind::Field if modifiers.is_static => Self::StaticField,
            MemberKind::Field => Self::PrivateField,
            _ => Self::PrivateMember,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accessibility {
    Public,
    Protected,
    ProtectedInternal,
    Internal,
    Private,
    PrivateProtected,
    /// No access modifier was written
    #[default]
    Unspecified,
}

impl Accessibility {
    /// Visible outside the declaring assembly
    pub fn is_public_facing(self) -> bool {
        matches!(self, Self::Public | Self::Protected | Self::ProtectedInternal)
    }

    /// Combine with another access keyword of the same declaration
    fn combine(self, keyword: &str) -> Self {
        match (self, keyword) {
            (Self::Protected, "internal") | (Self::Internal, "protected") => {
                Self::ProtectedInternal
            }
            (Self::Private, "protected") | (Self::Protected, "private") => Self::PrivateProtected,
            (_, "public") => Self::Public,
            (_, "protected") => Self::Protected,
            (_, "internal") => Self::Internal,
            (_, "private") => Self::Private,
            (current, _) => current,
        }
    }
}

/// Modifiers and attributes collected in front of a declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub accessibility: Accessibility,
    pub is_static: bool,
    pub is_const: bool,
    pub is_readonly: bool,
    /// `[ThreadStatic]` attribute present
    pub thread_static: bool,
}

impl Modifiers {
    /// Apply one modifier keyword; returns false when `keyword` is not one
    pub fn apply(&mut self, keyword: &str) -> bool {
        match keyword {
            "public" | "protected" | "internal" | "private" => {
                self.accessibility = self.accessibility.combine(keyword);
            }
            "static" => self.is_static = true,
            "const" => self.is_const = true,
            "readonly" => self.is_readonly = true,
            "abstract" | "virtual" | "override" | "sealed" | "extern" | "unsafe" | "volatile"
            | "async" | "partial" | "required" | "new" | "file" => {}
            _ => return false,
        }
        true
    }

    pub fn effective_accessibility(&self, owner: TypeKind) -> Accessibility {
        match self.accessibility {
            Accessibility::Unspecified if owner.members_default_public() => Accessibility::Public,
            other => other,
        }
    }
}

/// What kind of declaration introduced a binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Type,
    Field,
    Property,
    Method,
    Event,
    EnumMember,
    /// Positional parameter of a record, which becomes a public property
    RecordProperty,
    TypeParameter,
    Parameter,
    Local,
    LocalFunction,
}

/// Whether a local's type can be read off its initializer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Apparentness {
    /// `new` expression, literal or explicit cast
    Apparent,
    NotApparent,
    /// No initializer, as for foreach iteration variables
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalInfo {
    pub uses_var: bool,
    pub in_foreach: bool,
    pub apparentness: Apparentness,
}

/// Membership in a comma-separated declaration such as `int a, b;`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeclarationGroup {
    pub id: u32,
    /// Zero-based declarator index within the group
    pub index: u32,
}

/// A declared identifier and its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub role: Role,
    pub accessibility: Accessibility,
    pub member_kind: MemberKind,
    pub scope: ScopeId,
    pub position: Position,
    pub local: Option<LocalInfo>,
    pub group: Option<DeclarationGroup>,
}

impl Binding {
    pub fn new(
        name: impl Into<String>,
        role: Role,
        member_kind: MemberKind,
        position: Position,
    ) -> Self {
        Self {
            name: name.into(),
            role,
            accessibility: Accessibility::Unspecified,
            member_kind,
            scope: ScopeId(0),
            position,
            local: None,
            group: None,
        }
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_local(mut self, local: LocalInfo) -> Self {
        self.local = Some(local);
        self
    }

    pub fn with_group(mut self, group: Option<DeclarationGroup>) -> Self {
        self.group = group;
        self
    }

    pub fn uses_var(&self) -> bool {
        self.local.is_some_and(|l| l.uses_var)
    }

    pub fn in_foreach(&self) -> bool {
        self.local.is_some_and(|l| l.in_foreach)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: Option<String>,
    pub type_kind: Option<TypeKind>,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub bindings: Vec<BindingId>,
}

/// A `using` directive and where it sits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingDirective {
    /// Imported namespace or aliased type, as written
    pub target: String,
    pub alias: Option<String>,
    pub is_static: bool,
    pub is_global: bool,
    pub position: Position,
    /// Inside a block namespace body or after a file-scoped namespace declaration
    pub inside_namespace: bool,
    /// Name of the enclosing namespace when `inside_namespace`
    pub namespace: Option<String>,
}

/// All scopes, bindings and using directives of one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    bindings: Vec<Binding>,
    usings: Vec<UsingDirective>,
    next_group: u32,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::File,
                name: None,
                type_kind: None,
                parent: None,
                children: Vec::new(),
                bindings: Vec::new(),
            }],
            bindings: Vec::new(),
            usings: Vec::new(),
            next_group: 0,
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn add_scope(&mut self, kind: ScopeKind, name: Option<String>, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            name,
            type_kind: None,
            parent: Some(parent),
            children: Vec::new(),
            bindings: Vec::new(),
        });
        self.scopes[parent.0].children.push(id);
        id
    }

    pub fn add_type_scope(&mut self, type_kind: TypeKind, name: String, parent: ScopeId) -> ScopeId {
        let id = self.add_scope(ScopeKind::Type, Some(name), parent);
        self.scopes[id.0].type_kind = Some(type_kind);
        id
    }

    /// Attach a binding to `scope`; the binding's own scope field is overwritten
    pub fn add_binding(&mut self, scope: ScopeId, mut binding: Binding) -> BindingId {
        let id = BindingId(self.bindings.len());
        binding.scope = scope;
        self.bindings.push(binding);
        self.scopes[scope.0].bindings.push(id);
        id
    }

    pub fn add_using(&mut self, using: UsingDirective) {
        self.usings.push(using);
    }

    /// Allocate an id for a new declaration group
    pub fn next_group_id(&mut self) -> u32 {
        let id = self.next_group;
        self.next_group += 1;
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn binding(&self, id: BindingId) -> &Binding {
        &self.bindings[id.0]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes.iter().enumerate().map(|(i, s)| (ScopeId(i), s))
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn bindings_with_role(&self, role: Role) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().filter(move |b| b.role == role)
    }

    pub fn usings(&self) -> &[UsingDirective] {
        &self.usings
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    /// `id` followed by each enclosing scope up to the root
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), move |current| self.scopes[current.0].parent)
    }

    /// Nearest enclosing type scope kind, if any
    pub fn enclosing_type(&self, id: ScopeId) -> Option<TypeKind> {
        self.ancestors(id).find_map(|s| self.scopes[s.0].type_kind)
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modifiers(keywords: &[&str]) -> Modifiers {
        let mut m = Modifiers::default();
        for k in keywords {
            assert!(m.apply(k), "{k} is a modifier");
        }
        m
    }

    #[test]
    fn test_member_classification() {
        let class = TypeKind::Class;
        assert_eq!(
            Role::for_member(MemberKind::Field, &modifiers(&["public", "static"]), class),
            Role::PublicMember
        );
        assert_eq!(
            Role::for_member(MemberKind::Field, &modifiers(&["protected", "internal"]), class),
            Role::PublicMember
        );
        assert_eq!(
            Role::for_member(MemberKind::Field, &modifiers(&["private", "static"]), class),
            Role::StaticField
        );
        assert_eq!(
            Role::for_member(MemberKind::Field, &modifiers(&["internal"]), class),
            Role::PrivateField
        );
        assert_eq!(
            Role::for_member(MemberKind::Field, &modifiers(&["private", "protected"]), class),
            Role::PrivateField
        );
        assert_eq!(
            Role::for_member(MemberKind::Method, &modifiers(&[]), class),
            Role::PrivateMember
        );
        assert_eq!(
            Role::for_member(MemberKind::Field, &modifiers(&["public", "const"]), class),
            Role::Constant
        );

        let mut thread_static = modifiers(&["static"]);
        thread_static.thread_static = true;
        assert_eq!(
            Role::for_member(MemberKind::Field, &thread_static, class),
            Role::ThreadStaticField
        );
    }

    #[test]
    fn test_interface_members_default_public() {
        assert_eq!(
            Role::for_member(MemberKind::Method, &Modifiers::default(), TypeKind::Interface),
            Role::PublicMember
        );
    }

    #[test]
    fn test_tree_structure() {
        let mut tree = ScopeTree::new();
        let ns = tree.add_scope(ScopeKind::Namespace, Some("App".into()), tree.root());
        let ty = tree.add_type_scope(TypeKind::Class, "Service".into(), ns);
        let method = tree.add_scope(ScopeKind::Method, Some("Run".into()), ty);
        let binding = tree.add_binding(
            method,
            Binding::new("count", Role::Parameter, MemberKind::Parameter, Position::start()),
        );

        assert_eq!(tree.binding(binding).scope, method);
        assert_eq!(tree.scope(method).bindings, vec![binding]);
        assert_eq!(tree.ancestors(method).collect::<Vec<_>>(), vec![method, ty, ns, tree.root()]);
        assert_eq!(tree.enclosing_type(method), Some(TypeKind::Class));
        assert!(tree.scopes().all(|(id, s)| s.parent.map_or(true, |p| p < id)));
    }
}
