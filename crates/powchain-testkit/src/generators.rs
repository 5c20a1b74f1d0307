//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use powchain_core::{Block, BlockHash, Difficulty};

/// Generate a random BlockHash.
pub fn block_hash() -> impl Strategy<Value = BlockHash> {
    any::<[u8; 32]>().prop_map(BlockHash::from_bytes)
}

/// Generate a reasonable timestamp (Unix milliseconds).
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=4_102_444_800_000i64
}

/// Generate a difficulty cheap enough to mine in a test.
pub fn easy_difficulty() -> impl Strategy<Value = Difficulty> {
    (0u32..=2).prop_map(|zeros| Difficulty::new(zeros).unwrap_or(Difficulty::TRIVIAL))
}

/// Generate a JSON scalar. Floats are finite only; JSON has no NaN.
pub fn json_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<u64>().prop_map(Value::from),
        any::<f64>().prop_filter_map("non-finite", |f| Number::from_f64(f).map(Value::Number)),
        "\\PC{0,16}".prop_map(Value::String),
    ]
}

/// Generate an arbitrary JSON payload, nested up to a few levels.
pub fn payload() -> impl Strategy<Value = Value> {
    json_scalar().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-zA-Z_]{1,8}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Parameters for generating a block.
#[derive(Debug, Clone)]
pub struct BlockParams {
    pub index: u64,
    pub timestamp: i64,
    pub payload: Value,
    pub previous_hash: BlockHash,
    pub nonce: u64,
}

impl Arbitrary for BlockParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            0u64..=1_000_000u64, // index
            timestamp(),
            payload(),
            block_hash(),
            any::<u64>(), // nonce
        )
            .prop_map(|(index, timestamp, payload, previous_hash, nonce)| BlockParams {
                index,
                timestamp,
                payload,
                previous_hash,
                nonce,
            })
            .boxed()
    }
}

/// Build a block from parameters, with its hash computed.
pub fn block_from_params(params: &BlockParams) -> Block {
    let mut block = Block::seal(
        params.index,
        params.timestamp,
        params.payload.clone(),
        params.previous_hash,
    );
    block.nonce = params.nonce;
    block.recompute_hash();
    block
}
