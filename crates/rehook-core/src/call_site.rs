use std::borrow::Cow;
use std::fmt;

/// Identity of one hook invocation site within a component body.
///
/// Hooks are matched to their storage by this id, so a component must use the
/// same set of ids, in the same relative order, on every render. Reusing an id
/// for a different hook (or a different value type) silently recycles the slot.
///
/// Indexes are unsigned; signed integers do not convert, so an id like `-1`
/// cannot wrap onto another slot:
///
/// ```compile_fail
/// let id: rehook_core::CallSiteId = (-1i32).into();
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallSiteId {
    Index(u64),
    Key(Cow<'static, str>),
}

impl fmt::Display for CallSiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallSiteId::Index(i) => write!(f, "#{i}"),
            CallSiteId::Key(k) => f.write_str(k),
        }
    }
}

impl From<u64> for CallSiteId {
    fn from(i: u64) -> Self {
        CallSiteId::Index(i)
    }
}

impl From<u32> for CallSiteId {
    fn from(i: u32) -> Self {
        CallSiteId::Index(u64::from(i))
    }
}

impl From<usize> for CallSiteId {
    fn from(i: usize) -> Self {
        CallSiteId::Index(i as u64)
    }
}

impl From<&'static str> for CallSiteId {
    fn from(k: &'static str) -> Self {
        CallSiteId::Key(Cow::Borrowed(k))
    }
}

impl From<String> for CallSiteId {
    fn from(k: String) -> Self {
        CallSiteId::Key(Cow::Owned(k))
    }
}

/// Call-site id derived from the source position of the macro invocation.
///
/// Stable as long as the hook call does not move in the source; prefer an
/// explicit key for hooks inside helpers shared by several call sites.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSiteId::Key(::std::borrow::Cow::Borrowed(concat!(
            module_path!(),
            ":",
            line!(),
            ":",
            column!()
        )))
    };
}
