use donation::database::{Database, Repo, Result};
use model::{
    blood::{BloodGroup, BloodType, RhFactor},
    blood_bank::BloodBank,
    donor::Donor,
    institution::{InstitutionCategory, MedicalInstitution},
};
use utility::geo::GeoPoint;

use crate::MemoryDatabase;

fn blood_group(blood_type: BloodType, rh_factor: RhFactor) -> BloodGroup {
    BloodGroup {
        blood_type,
        rh_factor,
    }
}

/// Seeds a handful of donors, blood banks and institutions around Kiel so
/// the demo binary has something to serve.
pub async fn example_data(database: &MemoryDatabase) -> Result<()> {
    let mut ops = database.auto();

    let donors = [
        Donor {
            name: "Jona Petersen".to_owned(),
            blood_group: blood_group(BloodType::O, RhFactor::Negative),
            is_eligible: true,
            receive_donation_alerts: true,
            location: GeoPoint::new(10.1228, 54.3233).ok(),
            last_donation_date: None,
            phone: None,
            email: Some("jona.petersen@example.com".to_owned()),
        },
        Donor {
            name: "Mika Brandt".to_owned(),
            blood_group: blood_group(BloodType::A, RhFactor::Positive),
            is_eligible: true,
            receive_donation_alerts: false,
            location: GeoPoint::new(10.14, 54.32).ok(),
            last_donation_date: None,
            phone: Some("+49 431 000000".to_owned()),
            email: None,
        },
        Donor {
            name: "Elif Aydin".to_owned(),
            blood_group: blood_group(BloodType::Ab, RhFactor::Negative),
            is_eligible: false,
            receive_donation_alerts: true,
            location: None,
            last_donation_date: None,
            phone: None,
            email: Some("elif.aydin@example.com".to_owned()),
        },
    ];
    for donor in donors {
        Repo::<Donor>::insert(&mut ops, donor).await?;
    }

    let banks = [
        BloodBank {
            name: "Blutspendezentrale Kiel".to_owned(),
            address: "Hospitalstraße 42, 24105 Kiel".to_owned(),
            location: GeoPoint::new(10.1356, 54.3256).ok(),
            emergency_need: false,
            operating_hours: Some("Mo-Fr 08:00-18:00".to_owned()),
            phone: None,
        },
        BloodBank {
            name: "Blutspendedienst Gaarden".to_owned(),
            address: "Kaiserstraße 2, 24143 Kiel".to_owned(),
            location: GeoPoint::new(10.1602, 54.3148).ok(),
            emergency_need: true,
            operating_hours: Some("Mo-Sa 08:00-18:00".to_owned()),
            phone: Some("+49 431 111111".to_owned()),
        },
    ];
    for bank in banks {
        Repo::<BloodBank>::insert(&mut ops, bank).await?;
    }

    let institutions = [MedicalInstitution {
        name: "Städtisches Krankenhaus Kiel".to_owned(),
        category: InstitutionCategory::Hospital,
        address: Some("Chemnitzstraße 33, 24116 Kiel".to_owned()),
        location: GeoPoint::new(10.1081, 54.3289).ok(),
    }];
    for institution in institutions {
        Repo::<MedicalInstitution>::insert(&mut ops, institution).await?;
    }

    Ok(())
}
