//! Commercial classification.
//!
//! A fixed decision tree maps ads evidence and three landing-page flags to
//! exactly one [`CommercialTag`]. The classifier never emits
//! `DA_APPROFONDIRE`; that tag is set manually by the sales pipeline.

use serde::{Deserialize, Serialize};

use crate::ads::AdsLevel;
use crate::models::{Classification, CommercialTag};

/// Classifier inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierInput {
    pub ads_evidence: AdsLevel,
    pub tracking_present: bool,
    pub cta_clear: bool,
    pub offer_focused: bool,
    pub consent_mode_v2: bool,
}

fn verdict(tag: CommercialTag, reason: impl Into<String>) -> Classification {
    Classification {
        tag,
        reason: reason.into(),
        priority: tag.priority(),
        is_callable: tag.is_callable(),
    }
}

/// Assigns the commercial tag.
///
/// Rules, first match wins:
/// 1. no ads evidence → `NON_TARGET`
/// 2. strong/medium evidence without tracking → `ADS_ATTIVE_CONTROLLO_ASSENTE`
/// 3. strong/medium evidence without a clear CTA → `TRAFFICO_SENZA_DIREZIONE`
/// 4. strong/medium evidence without a focused offer → `STRUTTURA_OK_NON_PRIORITIZZATA`
///    (with a Consent Mode v2 warning when it is missing)
/// 5. weak evidence: tracking and CTA both present → `NON_TARGET`;
///    no tracking → `ADS_ATTIVE_CONTROLLO_ASSENTE`; otherwise `TRAFFICO_SENZA_DIREZIONE`
/// 6. anything else → `STRUTTURA_OK_NON_PRIORITIZZATA` with the raw flags as reason
pub fn classify(input: &ClassifierInput) -> Classification {
    let level = input.ads_evidence;

    if level == AdsLevel::None {
        return verdict(
            CommercialTag::NonTarget,
            "Nessuna evidenza di investimento pubblicitario",
        );
    }

    if level.is_established() {
        if !input.tracking_present {
            return verdict(
                CommercialTag::AdsAttiveControlloAssente,
                format!(
                    "Evidenza ads {level} ma nessun sistema di tracciamento: il budget pubblicitario non è misurato"
                ),
            );
        }
        if !input.cta_clear {
            return verdict(
                CommercialTag::TrafficoSenzaDirezione,
                format!(
                    "Evidenza ads {level} e tracciamento presente, ma il sito non ha call-to-action chiare"
                ),
            );
        }
        if !input.offer_focused {
            let mut reason = format!(
                "Evidenza ads {level}, tracciamento e CTA presenti, ma l'offerta è generica"
            );
            if !input.consent_mode_v2 {
                reason.push_str(". Attenzione: Consent Mode v2 non rilevato");
            }
            return verdict(CommercialTag::StrutturaOkNonPrioritizzata, reason);
        }
    }

    if level == AdsLevel::Weak {
        if input.tracking_present && input.cta_clear {
            return verdict(
                CommercialTag::NonTarget,
                "Segnale ads debole con tracciamento e CTA già presenti: probabile assenza di spesa reale",
            );
        }
        if !input.tracking_present {
            return verdict(
                CommercialTag::AdsAttiveControlloAssente,
                "Segnale ads debole e nessun sistema di tracciamento",
            );
        }
        return verdict(
            CommercialTag::TrafficoSenzaDirezione,
            "Segnale ads debole con tracciamento ma senza call-to-action chiare",
        );
    }

    verdict(
        CommercialTag::StrutturaOkNonPrioritizzata,
        format!(
            "Classificazione di ripiego: adsEvidence={level}, trackingPresent={}, ctaClear={}, offerFocused={}",
            input.tracking_present, input.cta_clear, input.offer_focused
        ),
    )
}
