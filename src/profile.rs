//! Profile completion leveling: a single shared pure function instead of
//! the per-screen copies the feature tends to grow. Levels gate strictly in
//! sequence, so a missing identity field caps the level no matter how much
//! later data is filled in.

/// The profile fields that feed the level computation. Text fields count as
/// present when they contain any non-whitespace character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileRecord {
    // Level 2: identity
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub national_id: String,
    // Level 3: locality
    pub country: String,
    pub region: String,
    pub district: String,
    // Level 4: precise address
    pub street_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    // Level 5: business
    pub business_name: String,
    pub tax_id: String,
}

fn present(value: &str) -> bool {
    !value.trim().is_empty()
}

impl ProfileRecord {
    pub fn identity_complete(&self) -> bool {
        present(&self.first_name)
            && present(&self.last_name)
            && present(&self.phone)
            && present(&self.national_id)
    }

    pub fn locality_complete(&self) -> bool {
        present(&self.country) && present(&self.region) && present(&self.district)
    }

    pub fn address_complete(&self) -> bool {
        present(&self.street_address) && self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn business_complete(&self) -> bool {
        present(&self.business_name) && present(&self.tax_id)
    }
}

/// Level 1 is the floor; each further level requires every previous group.
pub fn completion_level(record: &ProfileRecord) -> u8 {
    let gates = [
        record.identity_complete(),
        record.locality_complete(),
        record.address_complete(),
        record.business_complete(),
    ];

    let mut level = 1;
    for complete in gates {
        if !complete {
            break;
        }
        level += 1;
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn full_record() -> ProfileRecord {
        ProfileRecord {
            first_name: "Ana".into(),
            last_name: "Quispe".into(),
            phone: "+51 999 111 222".into(),
            national_id: "44556677".into(),
            country: "Peru".into(),
            region: "Lima".into(),
            district: "Miraflores".into(),
            street_address: "Av. Larco 123".into(),
            latitude: Some(-12.12),
            longitude: Some(-77.03),
            business_name: "Bodega Ana".into(),
            tax_id: "20123456789".into(),
        }
    }

    #[test]
    fn empty_record_is_level_one() {
        assert_eq!(completion_level(&ProfileRecord::default()), 1);
    }

    #[test]
    fn full_record_is_level_five() {
        assert_eq!(completion_level(&full_record()), 5);
    }

    #[test]
    fn each_gate_caps_the_level() {
        let mut r = full_record();
        r.tax_id.clear();
        assert_eq!(completion_level(&r), 4);

        let mut r = full_record();
        r.latitude = None;
        assert_eq!(completion_level(&r), 3);

        let mut r = full_record();
        r.district.clear();
        assert_eq!(completion_level(&r), 2);

        let mut r = full_record();
        r.phone = "   ".into(); // whitespace is not present
        assert_eq!(completion_level(&r), 1);
    }

    #[test]
    fn later_fields_do_not_skip_earlier_gates() {
        // Business data without identity stays at level 1
        let r = ProfileRecord {
            business_name: "Bodega Ana".into(),
            tax_id: "20123456789".into(),
            ..ProfileRecord::default()
        };
        assert_eq!(completion_level(&r), 1);
    }

    proptest! {
        #[test]
        fn levels_never_have_holes(mask in 0u8..16) {
            let mut r = ProfileRecord::default();
            if mask & 1 != 0 {
                r.first_name = "a".into();
                r.last_name = "b".into();
                r.phone = "c".into();
                r.national_id = "d".into();
            }
            if mask & 2 != 0 {
                r.country = "a".into();
                r.region = "b".into();
                r.district = "c".into();
            }
            if mask & 4 != 0 {
                r.street_address = "a".into();
                r.latitude = Some(0.0);
                r.longitude = Some(0.0);
            }
            if mask & 8 != 0 {
                r.business_name = "a".into();
                r.tax_id = "b".into();
            }

            let level = completion_level(&r);
            prop_assert!((1..=5).contains(&level));
            // Reaching level N means every earlier gate passed
            if level >= 2 { prop_assert!(r.identity_complete()); }
            if level >= 3 { prop_assert!(r.locality_complete()); }
            if level >= 4 { prop_assert!(r.address_complete()); }
            if level >= 5 { prop_assert!(r.business_complete()); }
        }
    }
}
