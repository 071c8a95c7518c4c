//! ANV aggregation along ancestor chains.

use tracing::{debug, error, warn};

use refdb_store::{AnvStore, InvariantViolation, KvStore, StoreError, WriteTxn};
use refdb_types::{Address, AddressAnv, AddressType, Amount};

use crate::codec::{self, encode};
use crate::keys;
use crate::ReferralsDb;

impl<S: KvStore> ReferralsDb<S> {
    fn try_update_anv(
        &self,
        address_type: AddressType,
        start: &Address,
        change: Amount,
    ) -> Result<usize, StoreError> {
        let mut txn = self.store.write_txn()?;
        let mut current = Some(*start);
        let mut levels = 0usize;

        while let Some(address) = current {
            if levels >= self.max_levels {
                return Err(InvariantViolation::CycleDetected {
                    start: *start,
                    levels,
                }
                .into());
            }

            // An address without a record yet starts from zero.
            let mut record = codec::read_anv(&txn, &address)?.unwrap_or_default();
            if levels == 0 {
                record.address_type = address_type;
                record.address = *start;
            }

            debug!(
                level = levels,
                %address,
                anv = record.anv,
                change,
                "propagating ANV"
            );

            let amount = record
                .anv
                .checked_add(change)
                .ok_or(InvariantViolation::AnvOverflow { address, change })?;
            if amount < 0 {
                return Err(InvariantViolation::NegativeAnv { address, amount }.into());
            }
            record.anv = amount;

            txn.put(&keys::anv_key(&address), &encode(&record)?)?;

            current = codec::read_parent(&txn, &address)?.filter(|parent| !parent.is_zero());
            levels += 1;
        }

        txn.commit()?;
        Ok(levels)
    }

    fn scan_anvs(&self) -> Result<Vec<AddressAnv>, StoreError> {
        let entries = self.store.scan_prefix(&[keys::DB_ANV])?;
        let mut anvs = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if keys::address_suffix(keys::DB_ANV, &key).is_none() {
                continue;
            }
            match codec::decode::<AddressAnv>(&value) {
                Ok(anv) => anvs.push(anv),
                Err(e) => warn!(error = %e, "skipping undecodable ANV record"),
            }
        }
        Ok(anvs)
    }
}

impl<S: KvStore> AnvStore for ReferralsDb<S> {
    fn update_anv(
        &self,
        address_type: AddressType,
        start: &Address,
        change: Amount,
    ) -> Result<(), StoreError> {
        debug!(%start, ?address_type, change, "updating ANV");
        match self.try_update_anv(address_type, start, change) {
            Ok(levels) => {
                debug!(%start, levels, "ANV updated");
                Ok(())
            }
            Err(e) if e.is_fatal() => {
                error!(%start, change, error = %e, "ANV update hit a broken invariant");
                Err(e)
            }
            Err(e) => {
                warn!(%start, change, error = %e, "ANV update failed");
                Err(e)
            }
        }
    }

    fn get_anv(&self, address: &Address) -> Result<Option<AddressAnv>, StoreError> {
        codec::read_anv(&self.store, address)
    }

    fn get_all_anvs(&self) -> Result<Vec<AddressAnv>, StoreError> {
        self.scan_anvs()
    }

    fn get_all_rewardable_anvs(&self) -> Result<Vec<AddressAnv>, StoreError> {
        let mut anvs = self.scan_anvs()?;
        anvs.retain(|anv| anv.address_type.is_rewardable());
        Ok(anvs)
    }
}
