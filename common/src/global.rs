use crate::context::Context;

pub trait GlobalCtx {
    fn ctx(&self) -> &Context;
}

/// Typed access to one config section, so handlers can ask the global state
/// for exactly the section they need.
pub trait GlobalConfigProvider<C> {
    fn provide_config(&self) -> &C;
}

pub trait GlobalConfig {
    #[inline(always)]
    fn config<C>(&self) -> &C
    where
        Self: GlobalConfigProvider<C>,
    {
        GlobalConfigProvider::provide_config(self)
    }
}
