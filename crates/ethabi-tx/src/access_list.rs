use crate::TxError;
use alloy_primitives::{Address, B256};
use ethabi_rlp::RlpItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

pub type AccessList = Vec<AccessListItem>;

pub(crate) fn encode_access_list(list: &AccessList) -> RlpItem {
    RlpItem::list(
        list.iter()
            .map(|item| {
                RlpItem::list(vec![
                    RlpItem::address(&item.address),
                    RlpItem::list(
                        item.storage_keys
                            .iter()
                            .map(|key| RlpItem::string(key.as_slice().to_vec()))
                            .collect(),
                    ),
                ])
            })
            .collect(),
    )
}

pub(crate) fn decode_access_list(item: &RlpItem) -> Result<AccessList, TxError> {
    item.as_list()?
        .iter()
        .map(|entry| {
            let fields = entry.as_list()?;
            if fields.len() != 2 {
                return Err(TxError::InvalidFieldCount(fields.len()));
            }
            let address = fields[0].to_address()?;
            let storage_keys = fields[1]
                .as_list()?
                .iter()
                .map(|key| key.as_string().map(B256::from_slice))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AccessListItem { address, storage_keys })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethabi_rlp::{decode, encode};

    #[test]
    fn access_list_round_trips() {
        let list = vec![AccessListItem {
            address: Address::ZERO,
            storage_keys: vec![B256::ZERO, B256::from([0xabu8; 32])],
        }];
        let item = encode_access_list(&list);
        let bytes = encode(&item);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decode_access_list(&decoded).unwrap(), list);
    }

    #[test]
    fn empty_access_list_encodes_as_empty_rlp_list() {
        let item = encode_access_list(&Vec::new());
        assert_eq!(encode(&item), vec![0xc0]);
    }
}
