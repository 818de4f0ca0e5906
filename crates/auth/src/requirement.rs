use std::borrow::Cow;

/// One entry of an action's authorization chain.
///
/// Top-level requirements are ANDed in declaration order. A group is an
/// alternative set: it passes when any of its members passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PolicyRequirement {
    Policy(Cow<'static, str>),
    Group(Vec<Cow<'static, str>>),
}

impl PolicyRequirement {
    pub fn policy(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Policy(name.into())
    }

    pub fn group<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        Self::Group(names.into_iter().map(Into::into).collect())
    }

    /// Every policy name this requirement references, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let names: &[Cow<'static, str>] = match self {
            PolicyRequirement::Policy(name) => core::slice::from_ref(name),
            PolicyRequirement::Group(names) => names,
        };
        names.iter().map(|n| n.as_ref())
    }
}

impl core::fmt::Display for PolicyRequirement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PolicyRequirement::Policy(name) => f.write_str(name),
            PolicyRequirement::Group(names) => write!(f, "[{}]", names.join(" | ")),
        }
    }
}
