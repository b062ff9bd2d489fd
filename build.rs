use std::collections::HashSet;
use std::path::Path;

fn main() {
    let ontology_path = Path::new("ontology/sequence_ontology_lite.json");
    validate_ontology_file(ontology_path);
    set_build_dependencies();
}

fn validate_ontology_file(ontology_path: &Path) {
    // Ensure the term table exists at build time
    assert!(
        ontology_path.exists(),
        "\n\nONTOLOGY BUILD ERROR: File not found\n\
         Path: {}\n\
         Please create the ontology file before building.\n",
        ontology_path.display()
    );

    let contents = std::fs::read_to_string(ontology_path).unwrap_or_else(|e| {
        panic!(
            "\n\nONTOLOGY BUILD ERROR: Failed to read file\n\
             Path: {}\n\
             Error: {e}\n",
            ontology_path.display()
        );
    });

    let ontology: serde_json::Value = serde_json::from_str(&contents).unwrap_or_else(|e| {
        panic!(
            "\n\nONTOLOGY BUILD ERROR: Invalid JSON\n\
             Path: {}\n\
             Error: {e}\n\
             Hint: Check for missing commas, brackets, or invalid syntax.\n",
            ontology_path.display()
        );
    });

    validate_ontology_structure(&ontology);
}

fn validate_ontology_structure(ontology: &serde_json::Value) {
    assert!(
        ontology.is_object(),
        "\n\nONTOLOGY BUILD ERROR: Root must be a JSON object\n\
         Got: {ontology}\n"
    );

    let terms = ontology.get("terms").unwrap_or_else(|| {
        panic!(
            "\n\nONTOLOGY BUILD ERROR: Missing 'terms' field\n\
             The ontology must have a top-level 'terms' array.\n"
        );
    });

    let terms = terms.as_array().unwrap_or_else(|| {
        panic!(
            "\n\nONTOLOGY BUILD ERROR: 'terms' must be an array\n\
             Got: {terms}\n"
        );
    });

    let names = validate_term_names(terms);
    let links = validate_term_parents(terms, &names);

    println!(
        "cargo:warning=Validated ontology: {} terms, {links} is-a links",
        terms.len()
    );
}

fn validate_term_names(terms: &[serde_json::Value]) -> HashSet<String> {
    let mut names = HashSet::new();

    for (i, term) in terms.iter().enumerate() {
        let name = term
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        assert!(
            !name.is_empty(),
            "\n\nONTOLOGY BUILD ERROR: Term at index {i} missing a non-empty 'name' field\n"
        );
        assert!(
            names.insert(name.to_string()),
            "\n\nONTOLOGY BUILD ERROR: Term '{name}' (index {i}) is listed twice\n"
        );
    }

    names
}

fn validate_term_parents(terms: &[serde_json::Value], names: &HashSet<String>) -> usize {
    let mut links = 0;

    for term in terms {
        let name = term
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("<unknown>");

        let parents = term
            .get("parents")
            .and_then(|p| p.as_array())
            .unwrap_or_else(|| {
                panic!("\n\nONTOLOGY BUILD ERROR: Term '{name}' missing a 'parents' array\n");
            });

        for parent in parents {
            let parent = parent.as_str().unwrap_or_default();
            assert!(
                names.contains(parent),
                "\n\nONTOLOGY BUILD ERROR: Term '{name}' has unknown parent '{parent}'\n\
                 Every parent must itself be a listed term.\n"
            );
        }
        links += parents.len();
    }

    links
}

fn set_build_dependencies() {
    // Tell cargo to rerun if the term table changes
    println!("cargo:rerun-if-changed=ontology/sequence_ontology_lite.json");

    // Tell cargo to rerun if build.rs changes
    println!("cargo:rerun-if-changed=build.rs");
}
