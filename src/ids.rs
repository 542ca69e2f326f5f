//! Small integer ids used to index the simulation's flat arenas.
//!
//! Hosts, interfaces and connections live in `Vec`s inside `Simulation`
//! rather than behind `Rc<RefCell<..>>` pointer graphs; everything else
//! refers to them by id. This sidesteps the cyclic
//! host ↔ interface ↔ connection ↔ peer-interface ↔ peer-host references
//! the design notes call out.

use std::fmt;

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                $name(v)
            }
        }
    };
}

arena_id!(HostId);
arena_id!(InterfaceId);
arena_id!(ConnectionId);
