//! Compile-time checks on the thread-safety of our public types.

use static_assertions::{assert_impl_all, assert_not_impl_any};

use crate::config::Config;
use crate::generator::MessageGenerator;
use crate::pool::SlotId;
use crate::registry::{
    BytesRandomizer, CustomRandomizerRegistry, MessageRandomizer, ProtobufRandomizerRegistry,
    RandomizerProvider,
};
use crate::schema::Schema;
use crate::value::{MessageBuilder, MessageValue};

// A generator is shared between threads behind an `Arc`.
assert_impl_all!(MessageGenerator: Send, Sync);
assert_impl_all!(Config: Send, Sync, Clone);
assert_impl_all!(Schema: Send, Sync);
assert_impl_all!(MessageValue: Send, Sync);
assert_impl_all!(MessageBuilder: Send);

assert_impl_all!(ProtobufRandomizerRegistry: Send, Sync);
assert_impl_all!(CustomRandomizerRegistry: Send, Sync);
assert_impl_all!(RandomizerProvider: Send, Sync);
assert_impl_all!(BytesRandomizer: Send, Sync);
assert_impl_all!(MessageRandomizer: Send, Sync);

// A slot handle is consumed when its slot completes.
assert_not_impl_any!(SlotId: Clone, Copy);
