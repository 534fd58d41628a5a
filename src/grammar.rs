//! Grammars: per-message transition tables and the actions run on each transition
//!
//! A [`Grammar`] maps `(state, identifier octet)` to a [`Transition`] through a
//! dense table with 256 slots per state. Grammars are built once, through a
//! [`GrammarBuilder`], and are read-only afterwards.
//!
//! Explicitly tagged SEQUENCE members are described with [`Field`]s. The
//! builder derives from the field list every transition that skips absent
//! OPTIONAL members, and every state in which the structure may end, so a
//! new optional member only has to be added in one place.
//!
//! Each transition also records the nesting depth its TLV must be read at,
//! so a member found inside the wrapper of the previous one is rejected
//! even though its tag is valid in the current state.

use std::fmt;

use crate::container::Container;
use crate::decoder::Decodable;
use crate::error::DecodeError;
use crate::krb5::{KerberosFlags, KerberosTime};
use crate::tlv::{Tag, Tlv};
use crate::value::{self, BitString};

/// A position in one grammar
pub trait GrammarState: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    /// Number of states; ordinals are `0..COUNT`
    const COUNT: usize;
    /// State of a fresh container
    const START: Self;

    fn ordinal(self) -> usize;
}

/// Declare the state enum of a grammar
macro_rules! grammar_states {
    ($(#[$meta:meta])* $vis:vis enum $name:ident { $first:ident $(, $rest:ident)* $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        $vis enum $name {
            $first,
            $($rest,)*
        }

        impl $crate::grammar::GrammarState for $name {
            const COUNT: usize = [stringify!($first) $(, stringify!($rest))*].len();
            const START: Self = $name::$first;

            fn ordinal(self) -> usize {
                self as usize
            }
        }
    };
}
pub(crate) use grammar_states;

/// Structure-specific step on a TLV
pub type ActionFn<T> = fn(&mut Container<T>, &Tlv<'_>) -> Result<(), DecodeError>;

/// What a transition does with the TLV that triggered it
///
/// The first three variants open a constructed TLV: only its header is
/// consumed and its children are matched next. All others consume the whole
/// TLV, value included.
pub enum Action<T: Decodable> {
    /// Open a constructed TLV
    Enter,
    /// Open a constructed TLV, rejecting an empty one
    CheckNotNullLength,
    /// Open a constructed TLV and run a hook
    EnterWith(ActionFn<T>),
    /// INTEGER bounded to `min..=max`
    StoreInteger {
        min: i64,
        max: i64,
        store: fn(&mut T, i64),
    },
    /// OCTET STRING, possibly required to be non-empty
    StoreOctetString {
        allow_empty: bool,
        store: fn(&mut T, Vec<u8>),
    },
    /// UTF-8 text (KerberosString, LDAPString, UTF8String)
    StoreString(fn(&mut T, String)),
    /// BIT STRING read as 32 Kerberos flags
    StoreBitString(fn(&mut T, KerberosFlags)),
    /// GeneralizedTime in KerberosTime form
    ReadKerberosTime(fn(&mut T, KerberosTime)),
    /// Consume the TLV with a structure-specific routine (nested decodes)
    Custom(ActionFn<T>),
}

impl<T: Decodable> Clone for Action<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Decodable> Copy for Action<T> {}

impl<T: Decodable> fmt::Debug for Action<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Action::Enter => "Enter",
            Action::CheckNotNullLength => "CheckNotNullLength",
            Action::EnterWith(_) => "EnterWith",
            Action::StoreInteger { .. } => "StoreInteger",
            Action::StoreOctetString { .. } => "StoreOctetString",
            Action::StoreString(_) => "StoreString",
            Action::StoreBitString(_) => "StoreBitString",
            Action::ReadKerberosTime(_) => "ReadKerberosTime",
            Action::Custom(_) => "Custom",
        };
        f.write_str(name)
    }
}

fn check_not_null_length(tlv: &Tlv<'_>) -> Result<(), DecodeError> {
    if tlv.length() == 0 {
        Err(DecodeError::ZeroLengthViolation {
            offset: tlv.offset(),
        })
    } else {
        Ok(())
    }
}

impl<T: Decodable> Action<T> {
    /// Whether the action needs the value octets, rather than just the header
    pub fn consumes_value(&self) -> bool {
        !matches!(
            self,
            Action::Enter | Action::CheckNotNullLength | Action::EnterWith(_)
        )
    }

    pub(crate) fn apply(&self, c: &mut Container<T>, tlv: &Tlv<'_>) -> Result<(), DecodeError> {
        let invalid = |source| DecodeError::InvalidValue {
            offset: tlv.offset(),
            source,
        };
        match *self {
            Action::Enter => Ok(()),
            Action::CheckNotNullLength => check_not_null_length(tlv),
            Action::EnterWith(hook) => hook(c, tlv),
            Action::StoreInteger { min, max, store } => {
                let v = value::parse_integer(tlv.value()).map_err(invalid)?;
                if v < min || v > max {
                    return Err(DecodeError::ValueOutOfRange {
                        offset: tlv.offset(),
                        value: v,
                        min,
                        max,
                    });
                }
                store(c.target_mut(), v);
                Ok(())
            }
            Action::StoreOctetString { allow_empty, store } => {
                if !allow_empty {
                    check_not_null_length(tlv)?;
                }
                store(c.target_mut(), value::parse_octet_string(tlv.value()));
                Ok(())
            }
            Action::StoreString(store) => {
                let s = value::parse_utf8_string(tlv.value()).map_err(invalid)?;
                store(c.target_mut(), s);
                Ok(())
            }
            Action::StoreBitString(store) => {
                let bits: BitString = value::parse_bit_string(tlv.value()).map_err(invalid)?;
                store(c.target_mut(), KerberosFlags::from(&bits));
                Ok(())
            }
            Action::ReadKerberosTime(store) => {
                let t = value::parse_kerberos_time(tlv.value()).map_err(invalid)?;
                store(c.target_mut(), t);
                Ok(())
            }
            Action::Custom(f) => f(c, tlv),
        }
    }
}

/// Target state and action of one table entry
pub struct Transition<T: Decodable> {
    pub next: T::State,
    pub action: Action<T>,
    /// Number of enclosing TLVs still open when the tag is read
    pub depth: usize,
}

impl<T: Decodable> Clone for Transition<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Decodable> Copy for Transition<T> {}

/// Immutable transition table of one message type
pub struct Grammar<T: Decodable> {
    name: &'static str,
    table: Vec<Option<Transition<T>>>,
    end_states: Vec<bool>,
}

impl<T: Decodable> Grammar<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Transition for `tag` in `state`; `None` means the tag is not valid there
    pub fn lookup(&self, state: T::State, tag: Tag) -> Option<&Transition<T>> {
        let b = tag.short_byte()?;
        self.table[state.ordinal() * 256 + usize::from(b)].as_ref()
    }

    /// Whether the structure may be complete after reaching `state`
    pub fn is_end_state(&self, state: T::State) -> bool {
        self.end_states[state.ordinal()]
    }

    /// Number of populated table entries
    pub fn transition_count(&self) -> usize {
        self.table.iter().filter(|t| t.is_some()).count()
    }
}

impl<T: Decodable> fmt::Debug for Grammar<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("name", &self.name)
            .field("transitions", &self.transition_count())
            .finish()
    }
}

/// One explicitly tagged member `[n]` of a SEQUENCE
///
/// The chain of inner transitions starts in `state`, reached when the
/// `[n]` wrapper is opened. The states the chain may stop in are the exits
/// from which the next member can start.
pub struct Field<T: Decodable> {
    number: u32,
    optional: bool,
    state: T::State,
    cursor: T::State,
    exits: Vec<T::State>,
    inner: Vec<(T::State, Tag, T::State, Action<T>)>,
}

impl<T: Decodable> Field<T> {
    fn new(number: u32, optional: bool, state: T::State) -> Self {
        Field {
            number,
            optional,
            state,
            cursor: state,
            exits: vec![state],
            inner: Vec::new(),
        }
    }

    pub fn required(number: u32, state: T::State) -> Self {
        Field::new(number, false, state)
    }

    pub fn optional(number: u32, state: T::State) -> Self {
        Field::new(number, true, state)
    }

    /// Next TLV inside the member
    pub fn then(mut self, tag: Tag, next: T::State, action: Action<T>) -> Self {
        self.inner.push((self.cursor, tag, next, action));
        self.cursor = next;
        self.exits = vec![next];
        self
    }

    /// Zero or more TLVs with the same tag (the elements of a SEQUENCE OF)
    pub fn repeated(mut self, tag: Tag, next: T::State, action: Action<T>) -> Self {
        self.inner.push((self.cursor, tag, next, action));
        self.inner.push((next, tag, next, action));
        self.exits = vec![self.cursor, next];
        self.cursor = next;
        self
    }
}

pub struct GrammarBuilder<T: Decodable> {
    name: &'static str,
    table: Vec<Option<Transition<T>>>,
    end_states: Vec<bool>,
    // depth at which the TLV following each state is read
    depths: Vec<Option<usize>>,
}

impl<T: Decodable> GrammarBuilder<T> {
    pub fn new(name: &'static str) -> Self {
        let count = <T::State as GrammarState>::COUNT;
        let mut depths = vec![None; count];
        depths[<T::State as GrammarState>::START.ordinal()] = Some(0);
        GrammarBuilder {
            name,
            table: (0..count * 256).map(|_| None).collect(),
            end_states: vec![false; count],
            depths,
        }
    }

    fn depth_of(&self, state: T::State) -> usize {
        self.depths[state.ordinal()].unwrap_or_else(|| {
            panic!("{}: no transition leads to {:?} yet", self.name, state)
        })
    }

    fn set_depth(&mut self, state: T::State, depth: usize) {
        self.depths[state.ordinal()] = Some(depth);
    }

    /// Add one table entry
    ///
    /// # Panics
    ///
    /// Panics if the entry is already taken, if the tag needs more than one
    /// identifier octet, or if `from` is not the target of an earlier
    /// transition. All are mistakes in the grammar definition.
    pub fn transition(self, from: T::State, tag: Tag, next: T::State, action: Action<T>) -> Self {
        let depth = self.depth_of(from);
        self.transition_at(depth, from, tag, next, action)
    }

    fn transition_at(
        mut self,
        depth: usize,
        from: T::State,
        tag: Tag,
        next: T::State,
        action: Action<T>,
    ) -> Self {
        let b = tag
            .short_byte()
            .unwrap_or_else(|| panic!("{}: tag {} cannot index a transition table", self.name, tag));
        let slot = &mut self.table[from.ordinal() * 256 + usize::from(b)];
        assert!(
            slot.is_none(),
            "{}: duplicate transition from {:?} on {}",
            self.name,
            from,
            tag
        );
        *slot = Some(Transition { next, action, depth });
        let inner = if action.consumes_value() { depth } else { depth + 1 };
        self.set_depth(next, inner);
        self
    }

    pub fn end_state(mut self, state: T::State) -> Self {
        self.end_states[state.ordinal()] = true;
        self
    }

    /// Add the members of a SEQUENCE whose header leads to `entry`
    ///
    /// Every member's `[n]` wrapper is reachable from the exits of the
    /// previous member and, across absent optional members, from any earlier
    /// exit. The exits that may be followed by nothing but optional members
    /// become end states.
    ///
    /// Wrappers are read at the depth of the SEQUENCE content, the chain of
    /// each member one level below. Afterwards the end states continue at
    /// the depth of the SEQUENCE itself.
    pub fn sequence(mut self, entry: T::State, fields: Vec<Field<T>>) -> Self {
        let depth = self.depth_of(entry);
        let mut sources = vec![entry];
        for field in fields {
            for &from in &sources {
                self = self.transition_at(
                    depth,
                    from,
                    Tag::context(field.number),
                    field.state,
                    Action::CheckNotNullLength,
                );
            }
            for (from, tag, next, action) in field.inner {
                self = self.transition(from, tag, next, action);
            }
            if field.optional {
                sources.extend(field.exits);
            } else {
                sources = field.exits;
            }
        }
        for state in sources {
            self.set_depth(state, depth.saturating_sub(1));
            self = self.end_state(state);
        }
        self
    }

    pub fn build(self) -> Grammar<T> {
        Grammar {
            name: self.name,
            table: self.table,
            end_states: self.end_states,
        }
    }
}
