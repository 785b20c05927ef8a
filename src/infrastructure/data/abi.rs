// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use crate::domain::constants::{
    MAGMA_STAKE_SELECTOR, MAGMA_UNSTAKE_SELECTOR, ZONA_BET_SELECTOR, ZONA_MARKET_TAG,
};
use alloy::dyn_abi::{DynSolValue, JsonAbiExt, Specifier};
use alloy::primitives::{Bytes, U256};
use alloy::sol;
use alloy_json_abi::JsonAbi;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IWrappedNative {
        function deposit() external payable;
        function withdraw(uint256 amount) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IKintsuStaking {
        function stake() external payable returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IAprioriStaking {
        function deposit(uint256 assets, address receiver) external payable returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IUniswapV2Router {
        function swapExactETHForTokens(uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external payable returns (uint256[] memory amounts);
    }
}

fn word(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

pub fn magma_stake_calldata() -> Bytes {
    Bytes::copy_from_slice(&MAGMA_STAKE_SELECTOR)
}

pub fn magma_unstake_calldata(amount: U256) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32);
    data.extend_from_slice(&MAGMA_UNSTAKE_SELECTOR);
    data.extend_from_slice(&word(amount));
    data.into()
}

/// Hand-laid calldata for the Zona price market bet:
/// `(uint8 0, bytes @0xa0, 0, 0, amount)` followed by the market tag.
pub fn zona_bet_calldata(amount: U256) -> Bytes {
    let tag = ZONA_MARKET_TAG.as_bytes();
    let mut padded_tag = [0u8; 32];
    padded_tag[..tag.len()].copy_from_slice(tag);

    let mut data = Vec::with_capacity(4 + 32 * 7);
    data.extend_from_slice(&ZONA_BET_SELECTOR);
    data.extend_from_slice(&word(U256::ZERO));
    data.extend_from_slice(&word(U256::from(0xa0u64)));
    data.extend_from_slice(&word(U256::ZERO));
    data.extend_from_slice(&word(U256::ZERO));
    data.extend_from_slice(&word(amount));
    data.extend_from_slice(&word(U256::from(tag.len())));
    data.extend_from_slice(&padded_tag);
    data.into()
}

/// Encode a call against an ABI delivered at runtime (e.g. by a REST API).
/// Arguments are given as text and coerced to each input's declared type.
pub fn encode_dynamic_call(
    abi: &JsonAbi,
    function_name: &str,
    args: &[String],
) -> Result<Bytes, AppError> {
    let function = abi
        .function(function_name)
        .and_then(|overloads| overloads.iter().find(|f| f.inputs.len() == args.len()))
        .ok_or_else(|| AppError::Validation {
            field: "abi".into(),
            message: format!("no {function_name} taking {} inputs", args.len()),
        })?;

    let values = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, raw)| {
            let ty = param.resolve().map_err(|e| AppError::Validation {
                field: param.name.clone(),
                message: format!("unsupported type {}: {e}", param.ty),
            })?;
            ty.coerce_str(raw).map_err(|e| AppError::Validation {
                field: param.name.clone(),
                message: format!("cannot coerce {raw:?} to {}: {e}", param.ty),
            })
        })
        .collect::<Result<Vec<DynSolValue>, AppError>>()?;

    let encoded = function
        .abi_encode_input(&values)
        .map_err(|e| AppError::Validation {
            field: function_name.into(),
            message: e.to_string(),
        })?;
    Ok(encoded.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, keccak256};
    use alloy::sol_types::SolCall;

    #[test]
    fn magma_unstake_appends_amount_word() {
        let data = magma_unstake_calldata(U256::from(1u64));
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &MAGMA_UNSTAKE_SELECTOR);
        assert_eq!(data[35], 1);
        assert_eq!(magma_stake_calldata().as_ref(), &MAGMA_STAKE_SELECTOR);
    }

    #[test]
    fn zona_layout_matches_market_template() {
        let amount = U256::from(1_000_000_000_000_000u64);
        let data = zona_bet_calldata(amount);
        assert_eq!(data.len(), 4 + 32 * 7);
        assert_eq!(&data[..4], &ZONA_BET_SELECTOR);
        assert_eq!(data[4 + 32 + 31], 0xa0);
        assert_eq!(U256::from_be_slice(&data[4 + 32 * 4..4 + 32 * 5]), amount);
        assert_eq!(data[4 + 32 * 5 + 31], 8);
        assert_eq!(&data[4 + 32 * 6..4 + 32 * 6 + 8], b"hongkong");
    }

    #[test]
    fn sol_selectors_match_signatures() {
        assert_eq!(
            IWrappedNative::depositCall::SELECTOR,
            keccak256("deposit()")[..4]
        );
        assert_eq!(
            IAprioriStaking::depositCall::SELECTOR,
            keccak256("deposit(uint256,address)")[..4]
        );
        let call = IUniswapV2Router::swapExactETHForTokensCall {
            amountOutMin: U256::ZERO,
            path: vec![address!("760AfE86e5de5fa0Ee542fc7B7B713e1c5425701")],
            to: address!("0000000000000000000000000000000000000001"),
            deadline: U256::from(600u64),
        };
        assert_eq!(&call.abi_encode()[..4], &keccak256("swapExactETHForTokens(uint256,address[],address,uint256)")[..4]);
    }

    #[test]
    fn dynamic_call_coerces_text_arguments() {
        let abi: JsonAbi = serde_json::from_str(
            r#"[{"type":"function","name":"feed","stateMutability":"nonpayable","outputs":[],
                "inputs":[{"name":"candidateID","type":"string"},{"name":"feedAmount","type":"uint256"},
                          {"name":"signature","type":"bytes"}]}]"#,
        )
        .unwrap();
        let data = encode_dynamic_call(
            &abi,
            "feed",
            &["abc".into(), "1".into(), "0xdeadbeef".into()],
        )
        .unwrap();
        assert_eq!(&data[..4], &keccak256("feed(string,uint256,bytes)")[..4]);

        let err = encode_dynamic_call(&abi, "feed", &["abc".into()]).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
        let err = encode_dynamic_call(
            &abi,
            "feed",
            &["abc".into(), "not-a-number".into(), "0x00".into()],
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }
}
