// Test fixtures for the end-of-line classifier
// WHY: fixed-width clinical notes wrapped near 60 columns; every paragraph ends on a short line
// closed by a period, so the expected label of each newline is known without annotation

#![allow(dead_code)]

/// Admission note, four wrapped paragraphs
pub const ADMISSION_NOTE: &str = "\
Le patient est admis pour une douleur thoracique apparue
au repos dans la matinee et qui persiste malgre la prise de
trinitrine par voie sublinguale.
A l'examen clinique la tension arterielle est a quatorze sur
huit et la frequence cardiaque est reguliere a quatre vingt
battements par minute.
Le bilan biologique retrouve une elevation moderee de la
troponine avec une fonction renale conservee et un bilan
hepatique normal.
Une coronarographie est programmee pour le lendemain matin
apres discussion avec le cardiologue de garde et accord du
patient.
";

/// Consultation note, three wrapped paragraphs
pub const CONSULTATION_NOTE: &str = "\
La patiente consulte pour une toux productive evoluant depuis
une dizaine de jours avec une fievre moderee le soir et une
fatigue importante.
La radiographie thoracique montre un foyer alveolaire de la
base droite sans epanchement pleural associe ni cavitation
visible.
Une antibiotherapie par amoxicilline est debutee pour une
duree de sept jours avec une reevaluation clinique prevue a
quarante huit heures.
";

/// Discharge note, two wrapped paragraphs
pub const DISCHARGE_NOTE: &str = "\
Sortie du service apres une hospitalisation de cinq jours
marquee par une evolution favorable sous traitement et une
reprise progressive de l'alimentation.
Le traitement de sortie comprend un antiagregant plaquettaire
et une statine a dose moderee ainsi qu'un betabloquant a
adapter.
";

/// Mixed layout: a heading, one wrapped paragraph whose wrap lands before a proper noun, a list
pub const HISTORY_NOTE: &str = "\
ANTECEDENTS
Hypertension arterielle traitee depuis une dizaine d'annees
par un inhibiteur calcique et un suivi regulier a l'hopital
Necker avec une bonne observance.
- tabagisme sevre
- dyslipidemie
";

/// Sentence end, blank line and a heading
pub const HEADING_SCENARIO: &str =
    "Le patient est arrivé hier soir.\nIl est accompagné par son fils\n\nANTECEDENTS\nHTA traitée par amlodipine.\n";

/// A sentence wrapped mid-phrase, then the final newline
pub const WRAPPED_SCENARIO: &str = "J'aime le \nfromage...\n";

/// Paragraphs separated only by blank lines
pub const BLANK_SEPARATED: &str =
    "Premier paragraphe court.\n\nDeuxième paragraphe, lui aussi court.\n\nTroisième et dernier.\n";

/// One ragged paragraph, lines 39 to 41 columns wide; the last wrap lands before a dosage
pub const RAGGED_PARAGRAPH: &str = "\
le patient recoit chaque jour une dose de
25 mg de metoprolol et une surveillance
de la frequence cardiaque est assuree par
l'equipe infirmiere avec un controle de
la kaliemie et de la fonction renale et
10 ml de solution de potassium le matin.
";

/// Every line 39 columns wide except the short last one; one wrap lands before a surname
pub const UNIFORM_WIDTH_PARAGRAPH: &str = "\
Le malade est adresse aux urgences dans
la nuit par son generaliste, le docteur
Martin, qui avait prevenu le service de
cardiologie avant son transfert, et qui
suivra son retour.
";

/// Training notes, in corpus order
pub fn training_notes() -> Vec<(&'static str, &'static str)> {
    vec![
        ("admission", ADMISSION_NOTE),
        ("consultation", CONSULTATION_NOTE),
        ("discharge", DISCHARGE_NOTE),
    ]
}
