//! Referral tree: referral records with parent and children indexes.

use tracing::{debug, warn};

use refdb_store::{KvStore, ReadTxn, ReferralStore, StoreError, WriteTxn};
use refdb_types::{Address, CodeHash, Referral};

use crate::codec::{self, encode};
use crate::keys;
use crate::ReferralsDb;

/// Resolve the inviter of `referral` through its previous referral, falling
/// back to the root sentinel when that referral is unknown.
fn inviter_of<R: ReadTxn + ?Sized>(r: &R, referral: &Referral) -> Result<Address, StoreError> {
    Ok(codec::read_referral(r, &referral.previous_referral)?
        .map(|parent| parent.pub_key_id)
        .unwrap_or(Address::ZERO))
}

impl<S: KvStore> ReferralsDb<S> {
    fn try_insert_referral(&self, referral: &Referral) -> Result<Address, StoreError> {
        let mut txn = self.store.write_txn()?;
        txn.put(&keys::referral_key(&referral.code_hash), &encode(referral)?)?;

        let parent = inviter_of(&txn, referral)?;
        txn.put(&keys::parent_key(&referral.pub_key_id), parent.as_bytes())?;

        let mut children = codec::read_children(&txn, &parent)?;
        children.push(referral.pub_key_id);
        txn.put(&keys::children_key(&parent), &encode(&children)?)?;

        txn.commit()?;
        Ok(parent)
    }

    fn try_remove_referral(&self, referral: &Referral) -> Result<Address, StoreError> {
        let mut txn = self.store.write_txn()?;
        if !txn.delete(&keys::referral_key(&referral.code_hash))? {
            debug!(code = %referral.code_hash, "removing referral that was not stored");
        }

        let parent = inviter_of(&txn, referral)?;
        txn.delete(&keys::parent_key(&referral.pub_key_id))?;

        let mut children = codec::read_children(&txn, &parent)?;
        children.retain(|child| child != &referral.pub_key_id);
        if children.is_empty() {
            txn.delete(&keys::children_key(&parent))?;
        } else {
            txn.put(&keys::children_key(&parent), &encode(&children)?)?;
        }

        txn.commit()?;
        Ok(parent)
    }
}

impl<S: KvStore> ReferralStore for ReferralsDb<S> {
    fn get_referral(&self, code_hash: &CodeHash) -> Result<Option<Referral>, StoreError> {
        codec::read_referral(&self.store, code_hash)
    }

    fn get_referrer(&self, address: &Address) -> Result<Option<Address>, StoreError> {
        Ok(codec::read_parent(&self.store, address)?.filter(|parent| !parent.is_zero()))
    }

    fn get_children(&self, address: &Address) -> Result<Vec<Address>, StoreError> {
        codec::read_children(&self.store, address)
    }

    fn insert_referral(&self, referral: &Referral) -> Result<(), StoreError> {
        match self.try_insert_referral(referral) {
            Ok(parent) => {
                debug!(
                    code = %referral.code_hash,
                    address = %referral.pub_key_id,
                    %parent,
                    "inserted referral"
                );
                Ok(())
            }
            Err(e) => {
                warn!(code = %referral.code_hash, error = %e, "referral insert failed");
                Err(e)
            }
        }
    }

    fn remove_referral(&self, referral: &Referral) -> Result<(), StoreError> {
        match self.try_remove_referral(referral) {
            Ok(parent) => {
                debug!(
                    code = %referral.code_hash,
                    address = %referral.pub_key_id,
                    %parent,
                    "removed referral"
                );
                Ok(())
            }
            Err(e) => {
                warn!(code = %referral.code_hash, error = %e, "referral removal failed");
                Err(e)
            }
        }
    }

    fn referral_code_exists(&self, code_hash: &CodeHash) -> Result<bool, StoreError> {
        self.store.exists(&keys::referral_key(code_hash))
    }

    fn has_parent_entry(&self, address: &Address) -> Result<bool, StoreError> {
        self.store.exists(&keys::parent_key(address))
    }
}
