//! Sales talking points and outreach script.
//!
//! Both outputs are derived from the same findings:
//! - a flat list of section-prefixed statements for the dashboard
//! - a three-block script: one compliment, up to three ranked problems and a
//!   call-to-action worded for the commercial tag

use strum_macros::{AsRefStr, EnumIter};

use crate::app::bare_host;
use crate::models::{AuditData, CommercialTag, OutreachScript, ProblemBlock};

/// Maximum number of problem blocks in a script.
pub const MAX_PROBLEM_BLOCKS: usize = 3;

/// Sales-service category of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, AsRefStr)]
pub enum Section {
    #[strum(serialize = "Web Design")]
    WebDesign,
    #[strum(serialize = "SEO")]
    Seo,
    #[strum(serialize = "Google Ads")]
    GoogleAds,
    #[strum(serialize = "Meta Ads")]
    MetaAds,
    #[strum(serialize = "Social")]
    Social,
    #[strum(serialize = "Local Marketing")]
    LocalMarketing,
    #[strum(serialize = "Contenuti")]
    Content,
    #[strum(serialize = "Email Marketing")]
    EmailMarketing,
    #[strum(serialize = "Compliance")]
    Compliance,
}

/// One deficiency statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub section: Section,
    pub statement: String,
}

fn finding(section: Section, statement: impl Into<String>) -> Finding {
    Finding {
        section,
        statement: statement.into(),
    }
}

fn months(days: i64) -> i64 {
    (days / 30).max(1)
}

/// Findings that only depend on the Google business fields.
fn local_marketing_findings(data: &AuditData, out: &mut Vec<Finding>) {
    match data.google_rating {
        None => out.push(finding(
            Section::LocalMarketing,
            "Nessuna valutazione su Google: la scheda attività non raccoglie recensioni",
        )),
        Some(r) if r < 4.0 => out.push(finding(
            Section::LocalMarketing,
            format!("Valutazione Google bassa ({r:.1}): scoraggia i nuovi clienti"),
        )),
        _ => {}
    }
    match data.google_reviews_count {
        Some(n) if n >= 50 => {}
        None | Some(0) => out.push(finding(
            Section::LocalMarketing,
            "Nessuna recensione su Google: i potenziali clienti non trovano conferme",
        )),
        Some(n) => out.push(finding(
            Section::LocalMarketing,
            format!("Solo {n} recensioni su Google: poche rispetto ai concorrenti"),
        )),
    }
}

/// Collects every deficiency found by the detectors.
///
/// For a partial audit (homepage unreachable) only the fetch failure and the
/// Google business findings are reported, since detector sections are defaults.
pub fn collect_findings(data: &AuditData) -> Vec<Finding> {
    let mut out = Vec::new();

    if let Some(err) = data.fetch_error.as_deref() {
        out.push(finding(
            Section::WebDesign,
            format!("Il sito non risponde correttamente ({err}): i visitatori potrebbero non raggiungerlo"),
        ));
        local_marketing_findings(data, &mut out);
        return out;
    }

    // Web design
    let perf = &data.performance;
    if perf.measured {
        if perf.performance_score < 50 {
            out.push(finding(
                Section::WebDesign,
                format!(
                    "Sito lento su mobile (punteggio prestazioni {}/100)",
                    perf.performance_score
                ),
            ));
        } else if perf.performance_score < 70 {
            out.push(finding(
                Section::WebDesign,
                format!(
                    "Prestazioni mobile migliorabili (punteggio {}/100)",
                    perf.performance_score
                ),
            ));
        }
        if !perf.is_mobile_friendly {
            out.push(finding(Section::WebDesign, "Sito non ottimizzato per smartphone"));
        }
    }
    if !data.has_https {
        out.push(finding(
            Section::WebDesign,
            "Sito senza HTTPS: il browser lo segnala come non sicuro",
        ));
    }
    if !data.trust.has_contact_form {
        out.push(finding(Section::WebDesign, "Nessun modulo di contatto sul sito"));
    }
    if !data.trust.has_instant_contact() {
        out.push(finding(
            Section::WebDesign,
            "Nessun canale di contatto immediato (WhatsApp o chat)",
        ));
    }
    if data.tech.is_outdated {
        out.push(finding(
            Section::WebDesign,
            format!(
                "Tecnologia obsoleta: {}",
                data.tech.outdated_reasons.join(", ")
            ),
        ));
    }

    // SEO
    let seo = &data.seo;
    if !seo.has_meta_title {
        out.push(finding(Section::Seo, "Manca il titolo della pagina (meta title)"));
    } else if seo.title_length_poor() {
        out.push(finding(
            Section::Seo,
            format!(
                "Meta title di lunghezza non ottimale ({} caratteri)",
                seo.meta_title_length
            ),
        ));
    }
    if !seo.has_meta_description {
        out.push(finding(Section::Seo, "Manca la meta description"));
    } else if seo.description_length_poor() {
        out.push(finding(
            Section::Seo,
            format!(
                "Meta description di lunghezza non ottimale ({} caratteri)",
                seo.meta_description_length
            ),
        ));
    }
    if seo.h1_count == 0 {
        out.push(finding(Section::Seo, "Nessun titolo H1 nella homepage"));
    } else if seo.h1_count > 1 {
        out.push(finding(
            Section::Seo,
            format!("{} titoli H1 nella homepage (ne serve uno)", seo.h1_count),
        ));
    }
    if seo.has_sitemap.is_absent() {
        out.push(finding(Section::Seo, "Sitemap XML assente"));
    }
    if seo.has_robots_txt.is_absent() {
        out.push(finding(Section::Seo, "File robots.txt assente"));
    }
    if !seo.has_schema_markup {
        out.push(finding(
            Section::Seo,
            "Nessun dato strutturato (schema.org) per i risultati di Google",
        ));
    }
    if seo.images_total > 0 && seo.alt_coverage < 0.5 {
        out.push(finding(
            Section::Seo,
            format!(
                "Solo {} immagini su {} hanno il testo alternativo",
                seo.images_with_alt, seo.images_total
            ),
        ));
    }
    if perf.measured && perf.lcp_ms > 2500 {
        out.push(finding(
            Section::Seo,
            format!(
                "Caricamento lento del contenuto principale (LCP {:.1}s)",
                f64::from(perf.lcp_ms) / 1000.0
            ),
        ));
    }

    // Google Ads / analytics
    let t = &data.tracking;
    if !t.has_google_analytics {
        out.push(finding(
            Section::GoogleAds,
            "Nessun Google Analytics: non sapete da dove arrivano i visitatori",
        ));
    }
    if !t.has_gtm {
        out.push(finding(Section::GoogleAds, "Nessun Google Tag Manager"));
    }
    if t.has_google_ads_tag && !t.has_google_ads_conversion {
        out.push(finding(
            Section::GoogleAds,
            "Tag Google Ads presente ma senza tracciamento delle conversioni",
        ));
    } else if !t.has_google_ads_tag && !t.has_google_ads_conversion {
        out.push(finding(
            Section::GoogleAds,
            "Nessun tag Google Ads: nessuna campagna misurabile",
        ));
    }

    // Meta Ads
    if !t.has_facebook_pixel {
        out.push(finding(
            Section::MetaAds,
            "Nessun Meta Pixel: impossibile fare remarketing su Facebook e Instagram",
        ));
    }

    // Social
    let missing: Vec<&str> = [
        (data.social.facebook.found, "Facebook"),
        (data.social.instagram.found, "Instagram"),
        (data.social.linkedin.found, "LinkedIn"),
        (data.social.youtube.found, "YouTube"),
    ]
    .into_iter()
    .filter(|(found, _)| !found)
    .map(|(_, name)| name)
    .collect();
    if !missing.is_empty() {
        out.push(finding(
            Section::Social,
            format!("Profili social non collegati al sito: {}", missing.join(", ")),
        ));
    }

    local_marketing_findings(data, &mut out);

    // Content
    let content = &data.content;
    if !content.has_blog {
        out.push(finding(
            Section::Content,
            "Nessun blog: il sito non produce contenuti per farsi trovare",
        ));
    } else if let Some(days) = content.days_since_last_post.filter(|d| *d > 90) {
        out.push(finding(
            Section::Content,
            format!("Blog fermo da {} mesi", months(days)),
        ));
    }

    // Email marketing
    let email = &data.email_marketing;
    if !email.has_newsletter_form {
        out.push(finding(
            Section::EmailMarketing,
            "Nessuna iscrizione alla newsletter: i contatti dei visitatori vanno persi",
        ));
    } else if !email.has_lead_magnet {
        out.push(finding(
            Section::EmailMarketing,
            "Newsletter senza incentivo all'iscrizione (guida, sconto, omaggio)",
        ));
    }

    // Compliance
    if !data.trust.has_cookie_banner {
        out.push(finding(
            Section::Compliance,
            "Nessun cookie banner: rischio sanzioni GDPR",
        ));
    }
    if !data.trust.has_privacy_policy {
        out.push(finding(Section::Compliance, "Nessun link alla privacy policy"));
    }
    if t.has_ad_platform_tags() && !t.has_consent_mode_v2 {
        out.push(finding(
            Section::Compliance,
            "Consent Mode v2 non rilevato: Google limita le campagne in Europa",
        ));
    }

    out
}

/// Section-prefixed statements for the dashboard, e.g. `"[SEO] Manca la meta description"`.
pub fn generate_talking_points(data: &AuditData) -> Vec<String> {
    collect_findings(data)
        .into_iter()
        .map(|f| format!("[{}] {}", f.section.as_ref(), f.statement))
        .collect()
}

/// Plain statements stored in `AuditData::issues`.
pub fn collect_issues(data: &AuditData) -> Vec<String> {
    collect_findings(data)
        .into_iter()
        .map(|f| f.statement)
        .collect()
}

fn select_compliment(data: &AuditData) -> String {
    if data.is_partial() {
        if let (Some(r), Some(n)) = (data.google_rating, data.google_reviews_count) {
            if r >= 4.5 {
                return format!("Complimenti per le {n} recensioni su Google con una media di {r:.1}: i clienti vi apprezzano.");
            }
        }
        return generic_compliment(data);
    }

    if let (Some(r), Some(n)) = (data.google_rating, data.google_reviews_count) {
        if r >= 4.5 && n > 0 {
            return format!("Complimenti per le {n} recensioni su Google con una media di {r:.1}: i clienti vi apprezzano.");
        }
    }
    if data.tracking.is_mature() {
        return "Ho notato che avete già un sistema di tracciamento evoluto (GA4, Tag Manager e pixel pubblicitari): non è scontato.".to_string();
    }
    if data
        .content
        .days_since_last_post
        .is_some_and(|d| d <= 90)
    {
        return "Ho visto che pubblicate regolarmente sul blog: è un ottimo segnale per Google e per i clienti.".to_string();
    }
    if data.tracking.has_google_analytics || data.tracking.has_gtm {
        return "Ho visto che misurate già le visite del sito con gli strumenti di Google.".to_string();
    }
    if data.social.platforms_found() >= 2 {
        return format!(
            "Ho visto che siete presenti su {} social network e li collegate al sito.",
            data.social.platforms_found()
        );
    }
    if data.has_https && data.trust.has_contact_form {
        return "Il sito è protetto con HTTPS e ha un modulo di contatto: la base c'è.".to_string();
    }
    generic_compliment(data)
}

fn generic_compliment(data: &AuditData) -> String {
    match bare_host(&data.website) {
        Some(host) => format!("Ho dato un'occhiata al vostro sito {host} e alla vostra presenza online."),
        None => "Ho dato un'occhiata alla vostra presenza online.".to_string(),
    }
}

fn block(area: &str, problem: impl Into<String>, impact: &str) -> ProblemBlock {
    ProblemBlock {
        area: area.to_string(),
        problem: problem.into(),
        impact: impact.to_string(),
    }
}

/// Problem candidates in fixed priority order; the first three qualifying win.
fn problem_candidates(data: &AuditData) -> Vec<ProblemBlock> {
    let mut out = Vec::new();

    if let Some(err) = data.fetch_error.as_deref() {
        out.push(block(
            "Sito web",
            format!("Il sito non si è caricato durante la nostra analisi ({err})"),
            "Se non carica per noi, non carica nemmeno per i vostri potenziali clienti",
        ));
        return out;
    }

    let t = &data.tracking;
    let perf = &data.performance;
    let seo = &data.seo;

    if !t.tracking_present() {
        out.push(block(
            "Tracciamento",
            "Non c'è nessun sistema di tracciamento (Google Analytics o Tag Manager)",
            "Non sapete quali canali vi portano clienti né quanto rende ogni euro investito",
        ));
    }
    if perf.measured && perf.performance_score < 50 {
        out.push(block(
            "Prestazioni",
            format!(
                "Il sito è lento su mobile (punteggio {}/100)",
                perf.performance_score
            ),
            "Più della metà dei visitatori abbandona una pagina che impiega oltre 3 secondi",
        ));
    }
    if t.has_ad_platform_tags() && !t.has_google_ads_conversion {
        out.push(block(
            "Pubblicità",
            "Avete tag pubblicitari installati ma nessuna conversione misurata",
            "State pagando traffico senza sapere quali campagne generano contatti",
        ));
    }
    if !seo.has_meta_title || !seo.has_meta_description || seo.h1_count == 0 {
        out.push(block(
            "SEO",
            "Mancano elementi SEO di base (titolo, descrizione o H1)",
            "Google fatica a capire cosa offrite e vi mostra meno nelle ricerche",
        ));
    }
    if !data.trust.has_cookie_banner || (t.has_ad_platform_tags() && !t.has_consent_mode_v2) {
        out.push(block(
            "Privacy e cookie",
            "La gestione del consenso cookie non è conforme",
            "Rischio di sanzioni GDPR e di campagne limitate da Google",
        ));
    }
    let content = &data.content;
    if !content.has_blog {
        out.push(block(
            "Contenuti",
            "Il sito non ha un blog o una sezione news",
            "Senza contenuti nuovi il sito perde posizioni rispetto ai concorrenti",
        ));
    } else if let Some(days) = content.days_since_last_post.filter(|d| *d > 180) {
        out.push(block(
            "Contenuti",
            format!("Il blog è fermo da {} mesi", months(days)),
            "Un blog abbandonato comunica un'attività poco curata",
        ));
    }
    if data.social.platforms_found() == 0 {
        out.push(block(
            "Social",
            "Il sito non rimanda a nessun profilo social",
            "I clienti non trovano conferme della vostra attività sui social",
        ));
    }
    if perf.measured && !perf.is_mobile_friendly {
        out.push(block(
            "Mobile",
            "Il sito non è ottimizzato per smartphone",
            "La maggior parte delle ricerche locali avviene da telefono",
        ));
    }
    if !data.email_marketing.has_newsletter_form {
        out.push(block(
            "Email marketing",
            "Non raccogliete i contatti dei visitatori con una newsletter",
            "Chi visita il sito e non compra subito non torna più",
        ));
    }
    if data.tech.is_outdated {
        out.push(block(
            "Tecnologia",
            format!(
                "Il sito usa versioni obsolete ({})",
                data.tech.outdated_reasons.join(", ")
            ),
            "Software non aggiornato espone a problemi di sicurezza",
        ));
    }
    out
}

fn call_to_action(tag: CommercialTag) -> String {
    match tag {
        CommercialTag::AdsAttiveControlloAssente => {
            "Vi propongo una verifica gratuita di 20 minuti sul tracciamento delle vostre campagne: vi mostro quanta parte del budget oggi non viene misurata."
        }
        CommercialTag::TrafficoSenzaDirezione => {
            "Possiamo sentirci 15 minuti? Vi mostro come trasformare il traffico che già pagate in richieste di contatto."
        }
        CommercialTag::StrutturaOkNonPrioritizzata => {
            "Vi propongo un'analisi gratuita per rendere l'offerta più chiara e dare priorità ai servizi che rendono di più."
        }
        CommercialTag::NonTarget => {
            "Se vi interessa, posso inviarvi il report completo dell'analisi del sito."
        }
        CommercialTag::DaApprofondire => {
            "Mi piacerebbe approfondire con voi la situazione: quando posso richiamarvi?"
        }
    }
    .to_string()
}

/// Builds the three-block outreach script.
///
/// At most [`MAX_PROBLEM_BLOCKS`] problems are kept, in candidate priority order.
pub fn generate_outreach_script(data: &AuditData, tag: CommercialTag) -> OutreachScript {
    let mut problems = problem_candidates(data);
    problems.truncate(MAX_PROBLEM_BLOCKS);
    OutreachScript {
        compliment: select_compliment(data),
        problems,
        call_to_action: call_to_action(tag),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::{ContentResult, PerformanceResult, SocialLink};

    /// Site with tracking, fast pages, SEO basics and social links in place.
    fn solid_site() -> AuditData {
        let mut data = AuditData {
            website: "https://www.rossi.it".into(),
            has_https: true,
            ..Default::default()
        };
        data.tracking.has_google_analytics = true;
        data.tracking.has_ga4 = true;
        data.tracking.has_gtm = true;
        data.seo.has_meta_title = true;
        data.seo.has_meta_description = true;
        data.seo.h1_count = 1;
        data.trust.has_cookie_banner = true;
        data.trust.has_contact_form = true;
        data.social.facebook = SocialLink {
            found: true,
            url: Some("https://facebook.com/rossi".into()),
        };
        data.email_marketing.has_newsletter_form = true;
        data.content = ContentResult {
            has_blog: true,
            days_since_last_post: Some(20),
            ..Default::default()
        };
        data
    }

    #[test]
    fn test_talking_points_are_section_prefixed() {
        let mut data = solid_site();
        data.seo.has_meta_description = false;
        data.tracking.has_facebook_pixel = false;
        let points = generate_talking_points(&data);
        assert!(points.contains(&"[SEO] Manca la meta description".to_string()));
        assert!(points.iter().any(|p| p.starts_with("[Meta Ads]")));
        assert!(!points.iter().any(|p| p.starts_with("[Contenuti]")));
    }

    #[test]
    fn test_neutral_performance_produces_no_performance_points() {
        let mut data = solid_site();
        data.performance = PerformanceResult::neutral();
        let points = generate_talking_points(&data);
        assert!(!points.iter().any(|p| p.contains("prestazioni") || p.contains("Prestazioni")));
    }

    #[test]
    fn test_stale_blog_problem_block() {
        let mut data = solid_site();
        data.content.days_since_last_post = Some(200);
        let script = generate_outreach_script(&data, CommercialTag::NonTarget);
        assert!(script
            .problems
            .iter()
            .any(|p| p.problem == "Il blog è fermo da 6 mesi"));
        assert!(generate_talking_points(&data).contains(&"[Contenuti] Blog fermo da 6 mesi".to_string()));
    }

    #[test]
    fn test_at_most_three_problems_in_priority_order() {
        let mut data = AuditData {
            website: "https://rossi.it".into(),
            ..Default::default()
        };
        data.performance = PerformanceResult {
            measured: true,
            performance_score: 20,
            is_mobile_friendly: false,
            ..PerformanceResult::neutral()
        };
        data.tracking.has_facebook_pixel = true;
        let script = generate_outreach_script(&data, CommercialTag::AdsAttiveControlloAssente);
        assert_eq!(script.problems.len(), MAX_PROBLEM_BLOCKS);
        let areas: Vec<&str> = script.problems.iter().map(|p| p.area.as_str()).collect();
        assert_eq!(areas, vec!["Tracciamento", "Prestazioni", "Pubblicità"]);
    }

    #[test]
    fn test_compliment_priority() {
        let mut data = solid_site();
        data.google_rating = Some(4.8);
        data.google_reviews_count = Some(87);
        assert!(select_compliment(&data).contains("87 recensioni"));

        data.google_rating = Some(4.1);
        data.tracking.has_facebook_pixel = true;
        assert!(select_compliment(&data).contains("tracciamento evoluto"));

        data.tracking.has_facebook_pixel = false;
        assert!(select_compliment(&data).contains("blog"));

        data.content.days_since_last_post = Some(400);
        assert!(select_compliment(&data).contains("misurate già"));
    }

    #[test]
    fn test_generic_compliment_names_the_site() {
        let data = AuditData {
            website: "https://www.rossi.it/".into(),
            ..Default::default()
        };
        assert!(select_compliment(&data).contains("rossi.it"));
    }

    #[test]
    fn test_call_to_action_branches_on_tag() {
        let data = solid_site();
        let ads = generate_outreach_script(&data, CommercialTag::AdsAttiveControlloAssente);
        let traffic = generate_outreach_script(&data, CommercialTag::TrafficoSenzaDirezione);
        assert_ne!(ads.call_to_action, traffic.call_to_action);
        assert!(ads.call_to_action.contains("tracciamento"));
    }

    #[test]
    fn test_partial_audit_reports_only_fetch_issue_and_google_fields() {
        let data = AuditData {
            website: "https://rossi.it".into(),
            fetch_error: Some("timeout after 15s".into()),
            google_rating: Some(3.5),
            ..Default::default()
        };
        let points = generate_talking_points(&data);
        assert_eq!(points.len(), 3);
        assert!(points[0].contains("timeout after 15s"));
        assert!(points.iter().all(|p| p.starts_with("[Web Design]") || p.starts_with("[Local Marketing]")));
        assert!(points.iter().any(|p| p.contains("Nessuna recensione su Google")));

        let script = generate_outreach_script(&data, CommercialTag::NonTarget);
        assert_eq!(script.problems.len(), 1);
        assert_eq!(script.problems[0].area, "Sito web");
    }
}
