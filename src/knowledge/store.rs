use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use crate::models::{
    AllergenEntry, EntryKind, EntryRef, InteractionRule, MedicationEntry, SubstanceEntry,
    UserProfile,
};

use super::error::{AmbiguousSynonym, LoadError};
use super::keys::normalize_key;
use super::source::{
    AllergenSource, InteractionSource, KnowledgeSources, KnowledgeVersion, MedicationSource,
};

/// Immutable allergen / medication / interaction knowledge with synonym and
/// ancestor indices built once at load time.
///
/// Nothing mutates after `load`, so one instance can be shared (`Arc`) by any
/// number of concurrent scans.
#[derive(Debug)]
pub struct KnowledgeBase {
    version: KnowledgeVersion,
    allergens: HashMap<String, AllergenEntry>,
    substances: HashMap<String, SubstanceEntry>,
    medications: HashMap<String, MedicationEntry>,
    rules: Vec<InteractionRule>,
    rules_by_medication: HashMap<String, Vec<usize>>,
    /// Allergen id -> [id, parent, grandparent, ..., root].
    ancestors: HashMap<String, Vec<String>>,
    /// Medication id -> [id, class, ..., root class].
    medication_classes: HashMap<String, Vec<String>>,
    /// Normalized key -> owning entries (sorted). BTreeMap keeps fuzzy search deterministic.
    synonyms: BTreeMap<String, Vec<EntryRef>>,
    ambiguities: Vec<AmbiguousSynonym>,
}

/// Free-text profile names mapped to knowledge base ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileResolution {
    pub profile: UserProfile,
    /// Names that matched nothing of the requested kind.
    pub unknown: Vec<String>,
}

impl KnowledgeBase {
    /// Validate the three sources and build the indices.
    /// Any schema or reference violation fails the whole load.
    pub fn load(
        allergens: AllergenSource,
        medications: MedicationSource,
        interactions: InteractionSource,
    ) -> Result<Self, LoadError> {
        let version = KnowledgeVersion {
            allergens: allergens.version,
            medications: medications.version,
            interactions: interactions.version,
        };

        let allergens = collect_entries(EntryKind::Allergen, allergens.allergens)?;
        let substances = collect_entries(EntryKind::Substance, interactions.substances)?;
        let medications = collect_entries(EntryKind::Medication, medications.medications)?;

        let mut collisions: Vec<&String> = substances
            .keys()
            .filter(|id| allergens.contains_key(*id))
            .collect();
        collisions.sort();
        if let Some(id) = collisions.first() {
            return Err(LoadError::IdCollision((*id).clone()));
        }

        let ancestors = build_ancestors(EntryKind::Allergen, &allergens)?;
        let medication_classes = build_ancestors(EntryKind::Medication, &medications)?;
        validate_cross_reactive(&allergens)?;
        let rules_by_medication =
            validate_rules(&interactions.rules, &medications, &allergens, &substances)?;

        let mut synonyms: BTreeMap<String, Vec<EntryRef>> = BTreeMap::new();
        for entry in allergens.values() {
            insert_keys(&mut synonyms, EntryKind::Allergen, entry);
        }
        for entry in substances.values() {
            insert_keys(&mut synonyms, EntryKind::Substance, entry);
        }
        for entry in medications.values() {
            insert_keys(&mut synonyms, EntryKind::Medication, entry);
        }
        for refs in synonyms.values_mut() {
            refs.sort();
        }

        let ambiguities = find_ambiguities(&synonyms);
        for ambiguity in &ambiguities {
            tracing::warn!(
                key = %ambiguity.key,
                candidates = ambiguity.candidates.len(),
                "Ambiguous synonym in knowledge base"
            );
        }

        tracing::info!(
            allergens = allergens.len(),
            substances = substances.len(),
            medications = medications.len(),
            rules = interactions.rules.len(),
            synonym_keys = synonyms.len(),
            ambiguous = ambiguities.len(),
            "Knowledge base loaded"
        );

        Ok(Self {
            version,
            allergens,
            substances,
            medications,
            rules: interactions.rules,
            rules_by_medication,
            ancestors,
            medication_classes,
            synonyms,
            ambiguities,
        })
    }

    pub fn from_sources(sources: KnowledgeSources) -> Result<Self, LoadError> {
        Self::load(sources.allergens, sources.medications, sources.interactions)
    }

    pub fn from_json(
        allergens_json: &str,
        medications_json: &str,
        interactions_json: &str,
    ) -> Result<Self, LoadError> {
        Self::from_sources(KnowledgeSources::from_json(
            allergens_json,
            medications_json,
            interactions_json,
        )?)
    }

    /// Load `allergens.json`, `medications.json` and `interactions.json` from a directory.
    pub fn load_dir(dir: &Path) -> Result<Self, LoadError> {
        Self::from_sources(KnowledgeSources::read_dir(dir)?)
    }

    /// Load the data set compiled into the crate.
    pub fn builtin() -> Result<Self, LoadError> {
        Self::from_sources(KnowledgeSources::bundled()?)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    pub fn version(&self) -> &KnowledgeVersion {
        &self.version
    }

    pub fn allergen(&self, id: &str) -> Option<&AllergenEntry> {
        self.allergens.get(id)
    }

    pub fn substance(&self, id: &str) -> Option<&SubstanceEntry> {
        self.substances.get(id)
    }

    pub fn medication(&self, id: &str) -> Option<&MedicationEntry> {
        self.medications.get(id)
    }

    pub fn contains(&self, entry: &EntryRef) -> bool {
        match entry.kind {
            EntryKind::Allergen => self.allergens.contains_key(&entry.id),
            EntryKind::Substance => self.substances.contains_key(&entry.id),
            EntryKind::Medication => self.medications.contains_key(&entry.id),
        }
    }

    /// Human-readable name for an entry, falling back to its id.
    pub fn display_name<'a>(&'a self, entry: &'a EntryRef) -> &'a str {
        let name = match entry.kind {
            EntryKind::Allergen => self.allergens.get(&entry.id).map(|e| &e.canonical_name),
            EntryKind::Substance => self.substances.get(&entry.id).map(|e| &e.canonical_name),
            EntryKind::Medication => self.medications.get(&entry.id).map(|e| &e.canonical_name),
        };
        name.map(String::as_str).unwrap_or(&entry.id)
    }

    /// All interaction rules, in source order.
    pub fn rules(&self) -> &[InteractionRule] {
        &self.rules
    }

    /// Rules declared for one medication or class id, in source order.
    /// Class rules are not included; see `applicable_rules`.
    pub fn rules_for_medication<'a>(
        &'a self,
        medication_id: &str,
    ) -> impl Iterator<Item = &'a InteractionRule> + 'a {
        self.rules_by_medication
            .get(medication_id)
            .into_iter()
            .flatten()
            .map(|&idx| &self.rules[idx])
    }

    /// Candidate entries for free text (normalized before lookup).
    /// The medication itself first, then its class, up to the root class.
    /// Empty for unknown ids.
    pub fn medication_classes(&self, medication_id: &str) -> &[String] {
        self.medication_classes
            .get(medication_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every rule that applies to a medication: its own, then those of each
    /// class above it.
    pub fn applicable_rules<'a>(
        &'a self,
        medication_id: &str,
    ) -> impl Iterator<Item = &'a InteractionRule> + 'a {
        self.medication_classes(medication_id)
            .iter()
            .flat_map(move |id| self.rules_for_medication(id))
    }

    pub fn resolve_synonym(&self, text: &str) -> Vec<EntryRef> {
        self.lookup_key(&normalize_key(text)).to_vec()
    }

    /// Candidate entries for an already-normalized key.
    pub fn lookup_key(&self, key: &str) -> &[EntryRef] {
        self.synonyms.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every indexed key, in sorted order.
    pub fn index_keys(&self) -> impl Iterator<Item = &str> {
        self.synonyms.keys().map(String::as_str)
    }

    /// `[allergen_id, parent, ..., root]`; empty for unknown ids.
    pub fn category_ancestors(&self, allergen_id: &str) -> &[String] {
        self.ancestors
            .get(allergen_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn ambiguities(&self) -> &[AmbiguousSynonym] {
        &self.ambiguities
    }

    /// Profile ids that do not exist in this knowledge base.
    pub fn unknown_profile_ids(&self, profile: &UserProfile) -> Vec<String> {
        let allergies = profile
            .allergy_ids
            .iter()
            .filter(|id| !self.allergens.contains_key(*id));
        let medications = profile
            .medication_ids
            .iter()
            .filter(|id| !self.medications.contains_key(*id));
        allergies.chain(medications).cloned().collect()
    }

    /// Build a profile from free-text allergy and medication names
    /// ("Peanuts", "Coumadin"). Ids are accepted as-is; other names go through
    /// the synonym index, and an ambiguous name keeps every candidate.
    pub fn resolve_profile<A, M>(&self, allergy_names: A, medication_names: M) -> ProfileResolution
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let mut resolution = ProfileResolution::default();
        for name in allergy_names {
            let ids = self.resolve_name(EntryKind::Allergen, name.as_ref());
            if ids.is_empty() {
                resolution.unknown.push(name.as_ref().to_string());
            }
            resolution.profile.allergy_ids.extend(ids);
        }
        for name in medication_names {
            let ids = self.resolve_name(EntryKind::Medication, name.as_ref());
            if ids.is_empty() {
                resolution.unknown.push(name.as_ref().to_string());
            }
            resolution.profile.medication_ids.extend(ids);
        }
        resolution
    }

    fn resolve_name(&self, kind: EntryKind, name: &str) -> Vec<String> {
        let trimmed = name.trim();
        let direct = match kind {
            EntryKind::Allergen => self.allergens.contains_key(trimmed),
            EntryKind::Medication => self.medications.contains_key(trimmed),
            EntryKind::Substance => self.substances.contains_key(trimmed),
        };
        if direct {
            return vec![trimmed.to_string()];
        }
        self.resolve_synonym(trimmed)
            .into_iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| entry.id)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Load-time validation
// ---------------------------------------------------------------------------

/// Common shape of the three entry tables.
trait Indexed {
    fn id(&self) -> &str;
    fn canonical_name(&self) -> &str;
    fn synonyms(&self) -> &BTreeSet<String>;
    /// Parent id in the category (allergen) or class (medication) tree.
    fn parent(&self) -> Option<&String> {
        None
    }
}

impl Indexed for AllergenEntry {
    fn id(&self) -> &str {
        &self.id
    }
    fn canonical_name(&self) -> &str {
        &self.canonical_name
    }
    fn synonyms(&self) -> &BTreeSet<String> {
        &self.synonyms
    }
    fn parent(&self) -> Option<&String> {
        self.category.as_ref()
    }
}

impl Indexed for SubstanceEntry {
    fn id(&self) -> &str {
        &self.id
    }
    fn canonical_name(&self) -> &str {
        &self.canonical_name
    }
    fn synonyms(&self) -> &BTreeSet<String> {
        &self.synonyms
    }
}

impl Indexed for MedicationEntry {
    fn id(&self) -> &str {
        &self.id
    }
    fn canonical_name(&self) -> &str {
        &self.canonical_name
    }
    fn synonyms(&self) -> &BTreeSet<String> {
        &self.synonyms
    }
    fn parent(&self) -> Option<&String> {
        self.class.as_ref()
    }
}

fn collect_entries<T: Indexed>(
    kind: EntryKind,
    entries: Vec<T>,
) -> Result<HashMap<String, T>, LoadError> {
    let mut map = HashMap::with_capacity(entries.len());
    for entry in entries {
        if entry.id().trim().is_empty() {
            return Err(LoadError::EmptyField {
                kind,
                id: entry.id().to_string(),
                field: "id",
            });
        }
        if normalize_key(entry.canonical_name()).is_empty() {
            return Err(LoadError::EmptyField {
                kind,
                id: entry.id().to_string(),
                field: "canonical_name",
            });
        }
        let id = entry.id().to_string();
        if map.contains_key(&id) {
            return Err(LoadError::DuplicateId { kind, id });
        }
        map.insert(id, entry);
    }
    Ok(map)
}

/// Walk `parent` links from every entry to its root. Allergens chain through
/// `category`, medications through `class`.
fn build_ancestors<T: Indexed>(
    kind: EntryKind,
    entries: &HashMap<String, T>,
) -> Result<HashMap<String, Vec<String>>, LoadError> {
    let mut ancestors = HashMap::with_capacity(entries.len());
    for entry in entries.values() {
        let mut chain = vec![entry.id().to_string()];
        let mut seen: HashSet<&str> = HashSet::from([entry.id()]);
        let mut current = entry;

        while let Some(parent_id) = current.parent() {
            let Some(parent) = entries.get(parent_id) else {
                return Err(unknown_parent(kind, current.id(), parent_id));
            };
            if !seen.insert(parent.id()) {
                return Err(match kind {
                    EntryKind::Medication => LoadError::ClassCycle(entry.id().to_string()),
                    _ => LoadError::CategoryCycle(entry.id().to_string()),
                });
            }
            chain.push(parent.id().to_string());
            current = parent;
        }

        ancestors.insert(entry.id().to_string(), chain);
    }
    Ok(ancestors)
}

fn unknown_parent(kind: EntryKind, id: &str, parent: &str) -> LoadError {
    match kind {
        EntryKind::Medication => LoadError::UnknownClass {
            id: id.to_string(),
            class: parent.to_string(),
        },
        _ => LoadError::UnknownCategory {
            id: id.to_string(),
            category: parent.to_string(),
        },
    }
}

fn validate_cross_reactive(allergens: &HashMap<String, AllergenEntry>) -> Result<(), LoadError> {
    for entry in allergens.values() {
        if let Some(target) = entry
            .cross_reactive
            .iter()
            .find(|target| !allergens.contains_key(*target))
        {
            return Err(LoadError::UnknownCrossReactive {
                id: entry.id.clone(),
                target: target.clone(),
            });
        }
    }
    Ok(())
}

/// Check rule references and index rules by medication id.
fn validate_rules(
    rules: &[InteractionRule],
    medications: &HashMap<String, MedicationEntry>,
    allergens: &HashMap<String, AllergenEntry>,
    substances: &HashMap<String, SubstanceEntry>,
) -> Result<HashMap<String, Vec<usize>>, LoadError> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    let mut by_medication: HashMap<String, Vec<usize>> = HashMap::new();

    for (idx, rule) in rules.iter().enumerate() {
        if rule.id.trim().is_empty() {
            return Err(LoadError::EmptyField {
                kind: EntryKind::Medication,
                id: rule.medication_id.clone(),
                field: "rule id",
            });
        }
        if !seen_ids.insert(rule.id.as_str()) {
            return Err(LoadError::DuplicateRule(rule.id.clone()));
        }
        if !medications.contains_key(&rule.medication_id) {
            return Err(LoadError::UnknownMedication {
                rule: rule.id.clone(),
                medication: rule.medication_id.clone(),
            });
        }
        if rule.triggering_ingredient_ids.is_empty() {
            return Err(LoadError::EmptyTriggers(rule.id.clone()));
        }
        if let Some(unknown) = rule
            .triggering_ingredient_ids
            .iter()
            .find(|id| !allergens.contains_key(*id) && !substances.contains_key(*id))
        {
            return Err(LoadError::UnknownTrigger {
                rule: rule.id.clone(),
                ingredient: unknown.clone(),
            });
        }
        by_medication
            .entry(rule.medication_id.clone())
            .or_default()
            .push(idx);
    }

    Ok(by_medication)
}

fn insert_keys<T: Indexed>(
    synonyms: &mut BTreeMap<String, Vec<EntryRef>>,
    kind: EntryKind,
    entry: &T,
) {
    let owner = EntryRef::new(kind, entry.id());
    let names = std::iter::once(entry.canonical_name()).chain(entry.synonyms().iter().map(String::as_str));
    for name in names {
        let key = normalize_key(name);
        if key.is_empty() {
            tracing::debug!(entry = %owner, synonym = name, "Skipping synonym with no letters or digits");
            continue;
        }
        let refs = synonyms.entry(key).or_default();
        if !refs.contains(&owner) {
            refs.push(owner.clone());
        }
    }
}

/// Keys owned by more than one ingredient (allergen or substance), or by more
/// than one medication. An ingredient sharing a key with a medication is not
/// ambiguous: the two are matched for different purposes.
fn find_ambiguities(synonyms: &BTreeMap<String, Vec<EntryRef>>) -> Vec<AmbiguousSynonym> {
    let mut ambiguities = Vec::new();
    for (key, refs) in synonyms {
        let ingredients: Vec<EntryRef> = refs
            .iter()
            .filter(|r| r.kind.is_ingredient())
            .cloned()
            .collect();
        let medications: Vec<EntryRef> = refs
            .iter()
            .filter(|r| r.kind == EntryKind::Medication)
            .cloned()
            .collect();
        for candidates in [ingredients, medications] {
            if candidates.len() > 1 {
                ambiguities.push(AmbiguousSynonym {
                    key: key.clone(),
                    candidates,
                });
            }
        }
    }
    ambiguities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::fixtures::{load_test, test_sources};

    #[test]
    fn knowledge_base_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KnowledgeBase>();
    }

    #[test]
    fn resolve_synonym_case_and_punctuation_insensitive() {
        let kb = load_test();
        assert_eq!(kb.resolve_synonym("Peanut Oil"), vec![EntryRef::allergen("peanut")]);
        assert_eq!(kb.resolve_synonym("  PEANUT-oil. "), vec![EntryRef::allergen("peanut")]);
        assert_eq!(kb.resolve_synonym("Coumadin"), vec![EntryRef::medication("warfarin")]);
        assert!(kb.resolve_synonym("xyzzium").is_empty());
    }

    #[test]
    fn ambiguous_synonym_keeps_all_candidates() {
        let kb = load_test();
        let candidates = kb.resolve_synonym("lecithin");
        assert_eq!(
            candidates,
            vec![EntryRef::allergen("egg"), EntryRef::allergen("soy")]
        );
        assert!(kb
            .ambiguities()
            .iter()
            .any(|a| a.key == "lecithin" && a.candidates.len() == 2));
    }

    #[test]
    fn ingredient_and_medication_sharing_key_not_ambiguous() {
        let kb = load_test();
        // "aspirin" is both a medication and a (salicylate) substance.
        let candidates = kb.resolve_synonym("aspirin");
        assert_eq!(candidates.len(), 2);
        assert!(!kb.ambiguities().iter().any(|a| a.key == "aspirin"));
    }

    #[test]
    fn category_ancestors_from_entry_to_root() {
        let kb = load_test();
        assert_eq!(kb.category_ancestors("casein"), ["casein", "milk"]);
        assert_eq!(kb.category_ancestors("milk"), ["milk"]);
        assert_eq!(kb.category_ancestors("cashew"), ["cashew", "tree_nut"]);
        assert!(kb.category_ancestors("unknown").is_empty());
    }

    #[test]
    fn rules_for_medication_in_source_order() {
        let kb = load_test();
        let ids: Vec<&str> = kb
            .rules_for_medication("warfarin")
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, ["warfarin_vitamin_k", "warfarin_alcohol"]);
        assert_eq!(kb.rules_for_medication("nothing").count(), 0);
    }

    #[test]
    fn medication_classes_from_member_to_root() {
        let kb = load_test();
        assert_eq!(kb.medication_classes("apixaban"), ["apixaban", "blood_thinner"]);
        assert_eq!(kb.medication_classes("blood_thinner"), ["blood_thinner"]);
        assert_eq!(kb.medication_classes("simvastatin"), ["simvastatin"]);
        assert!(kb.medication_classes("unknown").is_empty());
    }

    #[test]
    fn applicable_rules_include_class_rules() {
        let kb = load_test();
        let ids: Vec<&str> = kb.applicable_rules("warfarin").map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["warfarin_vitamin_k", "warfarin_alcohol", "blood_thinner_cranberry"]);

        let ids: Vec<&str> = kb.applicable_rules("apixaban").map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["blood_thinner_cranberry"]);
        assert_eq!(kb.rules_for_medication("apixaban").count(), 0);
    }

    #[test]
    fn rejects_unknown_medication_class() {
        let mut sources = test_sources();
        for entry in &mut sources.medications.medications {
            if entry.id == "simvastatin" {
                entry.class = Some("statin".into());
            }
        }
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::UnknownClass { ref id, ref class } if id == "simvastatin" && class == "statin"));
    }

    #[test]
    fn rejects_medication_class_cycle() {
        let mut sources = test_sources();
        for entry in &mut sources.medications.medications {
            if entry.id == "blood_thinner" {
                entry.class = Some("warfarin".into());
            }
        }
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::ClassCycle(_)));
    }

    #[test]
    fn rejects_dangling_medication_reference() {
        let mut sources = test_sources();
        sources.interactions.rules[0].medication_id = "ghost".into();
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::UnknownMedication { ref medication, .. } if medication == "ghost"));
    }

    #[test]
    fn rejects_dangling_trigger_reference() {
        let mut sources = test_sources();
        sources.interactions.rules[0]
            .triggering_ingredient_ids
            .insert("unobtainium".into());
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::UnknownTrigger { ref ingredient, .. } if ingredient == "unobtainium"));
    }

    #[test]
    fn rejects_empty_triggers() {
        let mut sources = test_sources();
        sources.interactions.rules[0].triggering_ingredient_ids.clear();
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::EmptyTriggers(_)));
    }

    #[test]
    fn rejects_duplicate_allergen_id() {
        let mut sources = test_sources();
        let dup = sources.allergens.allergens[0].clone();
        sources.allergens.allergens.push(dup);
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId { kind: EntryKind::Allergen, .. }));
    }

    #[test]
    fn rejects_duplicate_rule_id() {
        let mut sources = test_sources();
        let dup = sources.interactions.rules[0].clone();
        sources.interactions.rules.push(dup);
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateRule(_)));
    }

    #[test]
    fn rejects_substance_colliding_with_allergen() {
        let mut sources = test_sources();
        sources.interactions.substances.push(SubstanceEntry {
            id: "milk".into(),
            canonical_name: "Milk".into(),
            synonyms: BTreeSet::new(),
        });
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::IdCollision(ref id) if id == "milk"));
    }

    #[test]
    fn rejects_unknown_category() {
        let mut sources = test_sources();
        sources.allergens.allergens[0].category = Some("nonexistent".into());
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::UnknownCategory { ref category, .. } if category == "nonexistent"));
    }

    #[test]
    fn rejects_category_cycle() {
        let mut sources = test_sources();
        for entry in &mut sources.allergens.allergens {
            if entry.id == "milk" {
                entry.category = Some("casein".into());
            }
        }
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::CategoryCycle(_)));
    }

    #[test]
    fn rejects_self_parent() {
        let mut sources = test_sources();
        sources.allergens.allergens[0].category = Some(sources.allergens.allergens[0].id.clone());
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::CategoryCycle(_)));
    }

    #[test]
    fn rejects_unknown_cross_reactive() {
        let mut sources = test_sources();
        sources.allergens.allergens[0]
            .cross_reactive
            .insert("lupin".into());
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::UnknownCrossReactive { ref target, .. } if target == "lupin"));
    }

    #[test]
    fn rejects_blank_canonical_name() {
        let mut sources = test_sources();
        sources.medications.medications[0].canonical_name = " -- ".into();
        let err = KnowledgeBase::from_sources(sources).unwrap_err();
        assert!(matches!(err, LoadError::EmptyField { field: "canonical_name", .. }));
    }

    #[test]
    fn resolve_profile_from_names() {
        let kb = load_test();
        let resolution = kb.resolve_profile(["Peanuts", "milk", "Dragon scale"], ["Coumadin"]);
        assert!(resolution.profile.allergy_ids.contains("milk"));
        assert!(resolution.profile.medication_ids.contains("warfarin"));
        assert_eq!(resolution.unknown, vec!["Dragon scale".to_string()]);
        // "Peanuts" is a listed synonym of the peanut allergen.
        assert!(resolution.profile.allergy_ids.contains("peanut"));
    }

    #[test]
    fn resolve_profile_ignores_wrong_kind() {
        let kb = load_test();
        // Vitamin K is a substance, not an allergen.
        let resolution = kb.resolve_profile(["vitamin k"], Vec::<String>::new());
        assert!(resolution.profile.allergy_ids.is_empty());
        assert_eq!(resolution.unknown, vec!["vitamin k".to_string()]);
    }

    #[test]
    fn unknown_profile_ids_listed() {
        let kb = load_test();
        let profile = UserProfile::new(["milk", "unicorn"], ["warfarin", "elixir"]);
        assert_eq!(kb.unknown_profile_ids(&profile), vec!["unicorn", "elixir"]);
    }

    #[test]
    fn version_carried_from_sources() {
        let kb = load_test();
        assert_eq!(kb.version().allergens, "test-allergens-1");
        assert_eq!(kb.version().interactions, "test-interactions-1");
    }

    #[test]
    fn builtin_loads() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert!(kb.allergen("peanut").is_some());
        assert!(kb.medication("warfarin").is_some());
        assert_eq!(kb.resolve_synonym("soy lecithin"), vec![EntryRef::allergen("soy")]);
        assert_eq!(kb.resolve_synonym("Vitamin K"), vec![EntryRef::substance("vitamin_k")]);
    }

    #[test]
    fn load_dir_round_trip() {
        let sources = test_sources();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("allergens.json"),
            serde_json::to_string(&sources.allergens).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("medications.json"),
            serde_json::to_string(&sources.medications).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("interactions.json"),
            serde_json::to_string(&sources.interactions).unwrap(),
        )
        .unwrap();

        let kb = KnowledgeBase::load_dir(dir.path()).unwrap();
        assert_eq!(kb.category_ancestors("whey"), ["whey", "milk"]);
    }
}
