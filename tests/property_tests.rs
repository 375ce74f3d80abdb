//! Property-based tests for the message layer.
//!
//! - Composed frames decode back to the same header and payload
//! - Any single bit flip in a composed frame is rejected, as a MIC failure
//!   outside the MHDR and FCtrl bytes
//! - Session key derivation is deterministic and yields two distinct keys
//! - Payload masking is its own inverse
//! - Arbitrary input never panics the decoder

use lorawan_message::{
    config::device::{AESKey, DevAddr, NetId},
    config::session::SessionContext,
    crypto::{self, Direction},
    lorawan::{
        frame::{FCtrl, MType},
        mac::MacError,
        region::{DataRate, FrameFormat, Region},
    },
};
use proptest::prelude::*;

// Strategy for data frame types
fn data_mtype_strategy() -> impl Strategy<Value = MType> {
    prop_oneof![
        Just(MType::UnconfirmedDataUp),
        Just(MType::UnconfirmedDataDown),
        Just(MType::ConfirmedDataUp),
        Just(MType::ConfirmedDataDown),
    ]
}

// Strategy for keyed contexts at EU868/DR0 (51 byte payload limit)
fn context_strategy() -> impl Strategy<Value = SessionContext> {
    (any::<u32>(), any::<[u8; 16]>(), any::<[u8; 16]>()).prop_map(|(dev_addr, nwk_skey, app_skey)| {
        let mut ctx = SessionContext::new();
        ctx.init_format(FrameFormat::new(Region::EU868, DataRate::DR0));
        ctx.init_ids(NetId::new(1), DevAddr::new(dev_addr), AESKey::new(nwk_skey), AESKey::new(app_skey));
        ctx
    })
}

#[test]
fn prop_compose_decode_roundtrip() {
    proptest!(|(
        ctx in context_strategy(),
        mtype in data_mtype_strategy(),
        f_port in any::<u8>(),
        payload in prop::collection::vec(any::<u8>(), 0..=51),
        f_opts in prop::collection::vec(any::<u8>(), 0..=15),
        f_cnt in any::<u16>(),
    )| {
        let message = ctx.compose(mtype, FCtrl::default(), f_port, &payload, &f_opts, f_cnt).unwrap();
        let frame = ctx.decode(message.as_bytes()).unwrap();

        prop_assert_eq!(&frame, message.frame());
        prop_assert_eq!(&frame.payload[..], &payload[..]);
        prop_assert_eq!(frame.f_opts(), &f_opts[..]);
        prop_assert_eq!(frame.f_port, if payload.is_empty() { None } else { Some(f_port) });
    });
}

#[test]
fn prop_bit_flip_rejected() {
    proptest!(|(
        ctx in context_strategy(),
        payload in prop::collection::vec(any::<u8>(), 1..=51),
        f_cnt in any::<u16>(),
        bit in any::<prop::sample::Index>(),
    )| {
        let message = ctx.compose(MType::UnconfirmedDataUp, FCtrl::default(), 1, &payload, &[], f_cnt).unwrap();
        let mut bytes = message.as_bytes().to_vec();
        let bit = bit.index(bytes.len() * 8);
        bytes[bit / 8] ^= 1 << (bit % 8);

        match bit / 8 {
            // MHDR and FCtrl flips may break the structure before the MIC check
            0 | 5 => {
                prop_assert!(ctx.decode(&bytes).is_err());
            }
            _ => {
                prop_assert_eq!(ctx.decode(&bytes), Err(MacError::Mic));
            }
        }
    });
}

#[test]
fn prop_mask_is_involution() {
    proptest!(|(
        key in any::<[u8; 16]>(),
        dev_addr in any::<u32>(),
        f_cnt in any::<u32>(),
        down in any::<bool>(),
        data in prop::collection::vec(any::<u8>(), 0..=242),
    )| {
        let key = AESKey::new(key);
        let dev_addr = DevAddr::new(dev_addr);
        let dir = if down { Direction::Down } else { Direction::Up };

        let mut masked = data.clone();
        crypto::mask_payload(&key, dev_addr, f_cnt, dir, &mut masked);
        crypto::mask_payload(&key, dev_addr, f_cnt, dir, &mut masked);
        prop_assert_eq!(masked, data);
    });
}

#[test]
fn prop_session_keys_deterministic_and_distinct() {
    proptest!(|(
        app_key in any::<[u8; 16]>(),
        app_nonce in any::<[u8; 3]>(),
        net_id in any::<u32>(),
        dev_nonce in any::<u16>(),
    )| {
        let app_key = AESKey::new(app_key);
        let net_id = NetId::new(net_id);

        let keys = crypto::derive_session_keys(&app_key, &app_nonce, net_id, dev_nonce);
        let again = crypto::derive_session_keys(&app_key, &app_nonce, net_id, dev_nonce);

        prop_assert_eq!(keys, again);
        prop_assert_ne!(keys.nwk_skey, keys.app_skey);
    });
}

#[test]
fn prop_decode_never_panics() {
    proptest!(|(
        ctx in context_strategy(),
        bytes in prop::collection::vec(any::<u8>(), 0..=300),
    )| {
        let _ = ctx.get_header(&bytes);
        let _ = ctx.decode(&bytes);
    });
}
