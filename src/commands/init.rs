//! Initialize a new guide site

use anyhow::Result;
use std::fs;
use std::path::Path;

use super::new::MODULE_SCAFFOLD;
use crate::CONFIG_FILE;

const CONFIG_TEMPLATE: &str = r#"# Guide Configuration

# Site
title: Guide
description: ''
author: ''
language: en

# URL
url: http://example.com
root: /

# Directory
content_dir: content
public_dir: public

# Rendering
default_lang: cpp
description_length: 160
highlight:
  theme: InspiredGitHub
  line_number: true
"#;

const SAMPLE_MODULE: &str = r#"---
id: getting-started
title: Getting Started
author: Guide Team
description: How modules are written and organized.
frequency: 4
---

Every module is a markdown file inside a division directory such as
`1_General` or `3_Silver`.

## Writing a module

Front-matter holds the module `id`, `title`, `author`, `description`,
`prerequisites` and `frequency`.

## Language-specific notes

<!-- lang: cpp -->
### C++

```cpp
#include <bits/stdc++.h>
int main() { std::cout << "Hello\n"; }
```
<!-- /lang -->

<!-- lang: java -->
### Java

```java
public class Main { public static void main(String[] a) { System.out.println("Hello"); } }
```
<!-- /lang -->

<!-- lang: py -->
### Python

```py
print("Hello")
```
<!-- /lang -->
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir.join("content/1_General"))?;
    fs::create_dir_all(target_dir.join("scaffolds"))?;

    let config_path = target_dir.join(CONFIG_FILE);
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }

    fs::write(config_path, CONFIG_TEMPLATE)?;
    fs::write(target_dir.join("scaffolds/module.md"), MODULE_SCAFFOLD)?;
    fs::write(
        target_dir.join("content/1_General/getting-started.mdx"),
        SAMPLE_MODULE,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::loader::ContentLoader;
    use crate::content::Division;
    use crate::Guide;
    use tempfile::TempDir;

    #[test]
    fn test_init_site_loads() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        let guide = Guide::new(dir.path()).unwrap();
        assert_eq!(guide.config.title, "Guide");

        let modules = ContentLoader::new(&guide).load_modules().unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].division(), Division::General);
        assert_eq!(modules[0].toc.cpp.len(), 3);
        assert_eq!(modules[0].toc.py[2].value, "Python");

        assert!(init_site(dir.path()).is_err());
    }
}
