pub(crate) mod channels;
pub(crate) mod send;

pub(crate) use channels::channels;
pub(crate) use send::send;

use herald_lib::Dispatcher;

/// Parameters passed to every command
pub(crate) struct CommandParams<A> {
    pub(crate) dispatcher: Dispatcher,
    pub(crate) args: A,
}
